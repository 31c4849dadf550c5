//! Copying an image between registries, blob by blob.
//!
//! The manifest is read from the source, every blob it references is made
//! present at the destination (concurrently, on the worker pool, streamed
//! straight from the source), and only then is the manifest pushed. Any blob failure skips the push. Blobs that
//! were already copied stay where they are; they are content addressed and
//! harmless.

use crate::digest::Digest;
use crate::error::Result;
use crate::reference::RepoCommand;
use crate::registry::Registry;
use serde::Serialize;
use tracing::{debug, info, warn};


/// What a completed copy did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyReport {
    pub from: String,
    pub to: String,
    /// Digest of the pushed manifest, as served by the source
    pub manifest_digest: String,
    pub copied: Vec<Digest>,
    pub already_present: Vec<Digest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlobOutcome {
    Copied,
    AlreadyPresent,
}

/// Copies `from` to `to`. Both commands must carry a tag.
///
/// All blob tasks run to completion even when one fails; the first failure
/// in manifest order is returned and the manifest is not pushed.
pub async fn tag_image(
    registry: &Registry,
    from: &RepoCommand,
    to: &RepoCommand,
) -> Result<CopyReport> {
    from.require_tag("Tagging")?;
    to.require_tag("Tagging")?;

    let envelope = registry.get_manifest(from).await?;
    let digests = envelope.blob_digests(from.registry())?;
    debug!(
        "Copying {} blobs from {} to {}",
        digests.len(),
        from,
        to
    );

    let tasks = digests.iter().cloned().map(|digest| {
        let registry = registry.clone();
        let from = from.clone();
        let to = to.clone();
        async move { ensure_blob(&registry, &from, &to, &digest).await }
    });
    let outcomes = registry.pool().run_all(tasks).await;

    let mut report = CopyReport {
        from: from.to_string(),
        to: to.to_string(),
        manifest_digest: envelope.content_digest.clone(),
        copied: Vec::new(),
        already_present: Vec::new(),
    };

    for (digest, outcome) in digests.into_iter().zip(outcomes) {
        match outcome {
            Ok(BlobOutcome::Copied) => report.copied.push(digest),
            Ok(BlobOutcome::AlreadyPresent) => report.already_present.push(digest),
            Err(e) => {
                warn!(
                    "Blob {} could not be copied to {}, manifest not pushed: {}",
                    digest,
                    to.qualified_repo(),
                    e
                );
                return Err(e);
            }
        }
    }

    registry.put_manifest(to, &envelope).await?;

    info!(
        "Tagged image from={} to={} manifest={} copied={} present={}",
        report.from,
        report.to,
        report.manifest_digest,
        report.copied.len(),
        report.already_present.len()
    );
    Ok(report)
}

async fn ensure_blob(
    registry: &Registry,
    from: &RepoCommand,
    to: &RepoCommand,
    digest: &Digest,
) -> Result<BlobOutcome> {
    if registry.blob_exists(to, digest).await? {
        debug!("layer={} already exists in registry={}", digest, to.qualified_repo());
        return Ok(BlobOutcome::AlreadyPresent);
    }

    registry.transfer_blob(from, to, digest).await?;

    debug!("Blob={} pushed to={}", digest, to.qualified_repo());
    Ok(BlobOutcome::Copied)
}
