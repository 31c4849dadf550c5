//! High-level API for the cantus gateway.
//!
//! [`Cantus`] ties together reference resolution, the resilient registry
//! layer and the worker pool. It is cheap to clone and safe to share between
//! tasks; every clone uses the same HTTP connection pool and the same worker
//! permits. Lookups run on the pool's runtime, which is the caller's unless
//! [`CantusBuilder::with_runtime`] names another one.
//!
//! # Examples
//!
//! ```no_run
//! use libcantus::Cantus;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cantus = Cantus::builder().build()?;
//!
//!     let manifest = cantus
//!         .manifest("docker-registry.default.svc:5000/group/app:1.2.3", Some("token"))
//!         .await?;
//!     println!("{}", manifest.docker_digest);
//!
//!     for tag in cantus.tags("docker.io/library/alpine", None, Some("3.")).await? {
//!         println!("{} {:?}", tag.name, tag.kind);
//!     }
//!     Ok(())
//! }
//! ```

use crate::batch::{self, BatchResult};
use crate::client::{Client, ClientConfig};
use crate::config::Config;
use crate::copy::{self, CopyReport};
use crate::error::Result;
use crate::manifest::{self, NormalizedManifest};
use crate::metadata::RegistryMetadataResolver;
use crate::pool::WorkerPool;
use crate::reference::{RepoCommand, RepoCommandAssembler};
use crate::registry::Registry;
use crate::retry::RetryPolicy;
use crate::tag::{TagEntry, TagList};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;


/// Entry point for manifest lookups, tag listings and image copies.
#[derive(Clone)]
pub struct Cantus {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    assembler: RepoCommandAssembler,
    registry: Registry,
}

impl Cantus {
    /// Builds a gateway from `config` on the current tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        Self::builder().with_config(config).build()
    }

    pub fn builder() -> CantusBuilder {
        CantusBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Resolves `reference` into a command without touching the network.
    pub fn resolve(&self, reference: &str, credential: Option<&str>) -> Result<RepoCommand> {
        self.inner.assembler.assemble(reference, credential)
    }

    /// Fetches and normalizes the manifest of a tagged image.
    pub async fn manifest(
        &self,
        reference: &str,
        credential: Option<&str>,
    ) -> Result<NormalizedManifest> {
        let cmd = self.resolve(reference, credential)?;
        cmd.require_tag("Manifest lookup")?;
        let this = self.clone();
        self.pool()
            .spawn(async move { this.manifest_for(&cmd).await })
            .await
    }

    /// Lists the classified tags of a repository.
    ///
    /// A tag in `reference` is ignored. `filter` keeps only tags containing
    /// the given substring.
    pub async fn tags(
        &self,
        reference: &str,
        credential: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Vec<TagEntry>> {
        let cmd = self.resolve(reference, credential)?;
        let this = self.clone();
        let list = self
            .pool()
            .spawn(async move { this.tag_list_for(&cmd).await })
            .await?;
        Ok(match filter {
            Some(needle) => list
                .tags
                .into_iter()
                .filter(|t| t.name.contains(needle))
                .collect(),
            None => list.tags,
        })
    }

    /// Looks up many manifests at once. Each reference gets its own outcome.
    pub async fn manifests(
        &self,
        references: &[String],
        credential: Option<&str>,
    ) -> BatchResult<NormalizedManifest> {
        let credential = credential.map(str::to_string);
        batch::run(self.pool(), references, |reference| {
            let this = self.clone();
            let credential = credential.clone();
            async move {
                let cmd = this.resolve(&reference, credential.as_deref())?;
                cmd.require_tag("Manifest lookup")?;
                this.manifest_for(&cmd).await
            }
        })
        .await
    }

    /// Lists tags of many repositories at once.
    pub async fn tag_lists(
        &self,
        references: &[String],
        credential: Option<&str>,
    ) -> BatchResult<TagList> {
        let credential = credential.map(str::to_string);
        batch::run(self.pool(), references, |reference| {
            let this = self.clone();
            let credential = credential.clone();
            async move {
                let cmd = this.resolve(&reference, credential.as_deref())?;
                this.tag_list_for(&cmd).await
            }
        })
        .await
    }

    /// Copies the image `from` to `to`, blobs first, manifest last.
    pub async fn tag(
        &self,
        from: &str,
        from_credential: Option<&str>,
        to: &str,
        to_credential: Option<&str>,
    ) -> Result<CopyReport> {
        let from = self.resolve(from, from_credential)?;
        let to = self.resolve(to, to_credential)?;
        from.require_tag("Tagging")?;
        to.require_tag("Tagging")?;

        let this = self.clone();
        self.pool()
            .spawn(async move { copy::tag_image(&this.inner.registry, &from, &to).await })
            .await
    }

    fn pool(&self) -> &WorkerPool {
        self.inner.registry.pool()
    }

    async fn manifest_for(&self, cmd: &RepoCommand) -> Result<NormalizedManifest> {
        let envelope = self.inner.registry.get_manifest(cmd).await?;
        debug!("Fetched {:?} manifest for {}", envelope.schema(), cmd);
        manifest::normalize(&self.inner.registry, cmd, &envelope).await
    }

    async fn tag_list_for(&self, cmd: &RepoCommand) -> Result<TagList> {
        let names = self.inner.registry.get_tags(cmd).await?;
        Ok(TagList {
            repository: cmd.qualified_repo(),
            tags: names.into_iter().map(TagEntry::new).collect(),
        })
    }
}

/// Builder for [`Cantus`].
///
/// Without a config the defaults are used; environment overrides only apply
/// through [`CantusBuilder::with_config_file`] or [`Config::load`].
#[derive(Default)]
pub struct CantusBuilder {
    config: Option<Config>,
    config_file: Option<PathBuf>,
    runtime: Option<Handle>,
}

impl CantusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file at build time.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Sets configuration directly. Takes precedence over a config file.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Runs all registry I/O on `handle` instead of the caller's runtime.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Builds the gateway. Without [`CantusBuilder::with_runtime`] this must
    /// be called inside a tokio runtime.
    pub fn build(self) -> Result<Cantus> {
        let config = match (self.config, self.config_file) {
            (Some(config), _) => config,
            (None, Some(path)) => Config::load(Some(&path))?,
            (None, None) => Config::default(),
        };

        let client = Client::with_config(ClientConfig::from(&config.network))?;
        let pool = match self.runtime {
            Some(handle) => WorkerPool::new(handle, config.pool.workers),
            None => WorkerPool::current(config.pool.workers)?,
        };
        let assembler =
            RepoCommandAssembler::new(RegistryMetadataResolver::new(&config.registries));

        debug!(
            "Cantus ready with {} workers and {} internal registries",
            pool.size(),
            config.registries.internal.len()
        );
        let registry = Registry::new(client, RetryPolicy::from(&config.retry), pool);

        Ok(Cantus {
            inner: Arc::new(Inner {
                config,
                assembler,
                registry,
            }),
        })
    }
}
