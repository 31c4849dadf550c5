//! `cantus manifest`: normalized image metadata.

use crate::context::AppContext;
use crate::format::{self, OutputFormat, Status, or_dash};
use libcantus::{BatchResult, Cantus, NormalizedManifest};
use tabled::Tabled;

/// Key/value block for a single image.
pub fn describe(manifest: &NormalizedManifest) -> String {
    let mut lines = vec![
        format!("Digest:          {}", manifest.docker_digest),
        format!("Docker version:  {}", manifest.docker_version),
        format!("Build started:   {}", or_dash(manifest.build_started.as_deref())),
        format!("Build ended:     {}", manifest.build_ended),
        format!("Aurora version:  {}", or_dash(manifest.aurora_version.as_deref())),
        format!("App version:     {}", or_dash(manifest.app_version.as_deref())),
        format!("Node version:    {}", or_dash(manifest.node_version.as_deref())),
    ];

    if let Some(java) = &manifest.java {
        lines.push(format!(
            "Java:            {}.{}.{}",
            java.major, java.minor, java.build
        ));
        if let Some(jolokia) = &java.jolokia {
            lines.push(format!("Jolokia:         {}", jolokia));
        }
    }

    let timeline = manifest.timeline();
    if let (Some(started), Some(ended)) = (timeline.build_started, timeline.build_ended) {
        lines.push(format!(
            "Build duration:  {}s",
            (ended - started).num_seconds()
        ));
    }

    lines.join("\n")
}

/// One line per image in batch output.
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct ManifestRow {
    #[tabled(rename = "IMAGE")]
    pub image: String,
    #[tabled(rename = "DIGEST")]
    pub digest: String,
    #[tabled(rename = "APP")]
    pub app_version: String,
    #[tabled(rename = "AURORA")]
    pub aurora_version: String,
    #[tabled(rename = "BUILT")]
    pub build_ended: String,
}

impl ManifestRow {
    pub fn new(image: &str, manifest: &NormalizedManifest) -> Self {
        Self {
            image: image.to_string(),
            digest: manifest.docker_digest.clone(),
            app_version: or_dash(manifest.app_version.as_deref()),
            aurora_version: or_dash(manifest.aurora_version.as_deref()),
            build_ended: manifest.build_ended.clone(),
        }
    }
}

/// Renders a batch. In `pretty` only the successes; failures go to stderr.
pub fn render_batch(
    result: &BatchResult<NormalizedManifest>,
    format: OutputFormat,
) -> Result<String, String> {
    format::render(result, format, |result| {
        let rows: Vec<_> = result
            .successes
            .iter()
            .map(|item| ManifestRow::new(&item.reference, &item.value))
            .collect();
        format::table(&rows)
    })
}

/// Turns a batch into the command outcome: any failure fails the command.
pub fn batch_outcome<T>(result: &BatchResult<T>) -> Result<(), String> {
    if result.is_complete_success() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} references failed",
            result.failure_count(),
            result.len()
        ))
    }
}

/// Handle the manifest command. One reference is a single lookup, more are a batch.
pub async fn handle_manifest(
    ctx: &AppContext,
    cantus: &Cantus,
    references: &[String],
    token: Option<&str>,
) -> Result<(), String> {
    if let [reference] = references {
        let manifest = cantus
            .manifest(reference, token)
            .await
            .map_err(|e| e.to_string())?;
        println!("{}", format::render(&manifest, ctx.format, describe)?);
        return Ok(());
    }

    let result = cantus.manifests(references, token).await;

    let output = render_batch(&result, ctx.format)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    if ctx.format == OutputFormat::Pretty && !result.is_complete_success() {
        eprintln!("{}", format::failure_table(&result.failures));
        format::status(
            Status::Partial,
            &format!(
                "{} of {} images found",
                result.success_count(),
                result.len()
            ),
        );
    }

    batch_outcome(&result)
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
