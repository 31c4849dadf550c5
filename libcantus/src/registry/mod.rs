//! Registry operations module.
//!
//! [`Registry`] exposes every protocol operation of [`Client`] wrapped in the
//! [`RetryPolicy`], so callers above this layer only ever see terminal errors
//! attributed to the registry that produced them. Every attempt holds one
//! [`WorkerPool`] permit while it talks to the upstream; backoff sleeps do not.

use crate::client::Client;
use crate::digest::Digest;
use crate::error::Result;
use crate::manifest::{ImageConfigDocument, ManifestEnvelope};
use crate::pool::WorkerPool;
use crate::reference::RepoCommand;
use crate::retry::RetryPolicy;
use std::future::Future;


/// Retried, pool-bounded registry operations over a shared HTTP client.
#[derive(Debug, Clone)]
pub struct Registry {
    client: Client,
    retry: RetryPolicy,
    pool: WorkerPool,
}

impl Registry {
    /// Creates a new `Registry`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::client::Client;
    /// use libcantus::pool::WorkerPool;
    /// use libcantus::registry::Registry;
    /// use libcantus::retry::RetryPolicy;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let pool = WorkerPool::current(8).unwrap();
    /// let registry = Registry::new(Client::new().unwrap(), RetryPolicy::default(), pool);
    /// # }
    /// ```
    pub fn new(client: Client, retry: RetryPolicy, pool: WorkerPool) -> Self {
        Self {
            client,
            retry,
            pool,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Retries `operation`, holding a pool permit for each attempt.
    async fn call<T, F, Fut>(&self, registry: &str, context: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let operation = &operation;
        let pool = &self.pool;
        self.retry
            .run(registry, context, || async move {
                let _permit = pool.permit().await?;
                operation().await
            })
            .await
    }

    pub async fn get_manifest(&self, cmd: &RepoCommand) -> Result<ManifestEnvelope> {
        let context = format!("operation=get_manifest image={}", cmd);
        self.call(cmd.registry(), &context, || self.client.get_manifest(cmd))
            .await
    }

    pub async fn get_tags(&self, cmd: &RepoCommand) -> Result<Vec<String>> {
        let context = format!("operation=get_tags repo={}", cmd.qualified_repo());
        self.call(cmd.registry(), &context, || self.client.get_tags(cmd))
            .await
    }

    pub async fn get_config_blob(
        &self,
        cmd: &RepoCommand,
        digest: &Digest,
    ) -> Result<ImageConfigDocument> {
        let context = format!(
            "operation=get_config_blob repo={} digest={}",
            cmd.qualified_repo(),
            digest
        );
        self.call(cmd.registry(), &context, || {
            self.client.get_config_blob(cmd, digest)
        })
        .await
    }

    pub async fn blob_exists(&self, cmd: &RepoCommand, digest: &Digest) -> Result<bool> {
        let context = format!(
            "operation=blob_exists repo={} digest={}",
            cmd.qualified_repo(),
            digest
        );
        self.call(cmd.registry(), &context, || self.client.blob_exists(cmd, digest))
            .await
    }

    /// Streams a blob from `from` into a fresh upload session at `to`.
    ///
    /// The body is never buffered, so a failed attempt opens a new session
    /// and reads the source again. One permit covers both connections.
    pub async fn transfer_blob(
        &self,
        from: &RepoCommand,
        to: &RepoCommand,
        digest: &Digest,
    ) -> Result<()> {
        let context = format!(
            "operation=transfer_blob from={} to={} digest={}",
            from.qualified_repo(),
            to.qualified_repo(),
            digest
        );
        self.call(to.registry(), &context, || async move {
            let session = self.client.initiate_upload(to).await?;
            self.client.transfer_blob(from, to, &session, digest).await
        })
        .await
    }

    pub async fn put_manifest(&self, cmd: &RepoCommand, envelope: &ManifestEnvelope) -> Result<()> {
        let context = format!("operation=put_manifest image={}", cmd);
        self.call(cmd.registry(), &context, || {
            self.client.put_manifest(cmd, envelope)
        })
        .await
    }
}
