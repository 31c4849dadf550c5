//! `cantus tag`: copy an image under a new tag.

use crate::context::AppContext;
use crate::format::{self, OutputFormat, Status};
use libcantus::{Cantus, CopyReport};

/// What a copy did, for the status line.
pub fn summary(report: &CopyReport) -> String {
    format!(
        "Tagged {} as {}\n  manifest {}\n  {} blobs copied, {} already present",
        report.from,
        report.to,
        report.manifest_digest,
        report.copied.len(),
        report.already_present.len()
    )
}

/// Handle the tag command
pub async fn handle_tag(
    ctx: &AppContext,
    cantus: &Cantus,
    from: &str,
    from_token: Option<&str>,
    to: &str,
    to_token: Option<&str>,
) -> Result<(), String> {
    let report = cantus
        .tag(from, from_token, to, to_token)
        .await
        .map_err(|e| e.to_string())?;

    match ctx.format {
        OutputFormat::Pretty => format::status(Status::Done, &summary(&report)),
        _ => println!("{}", format::render(&report, ctx.format, summary)?),
    }
    Ok(())
}

#[cfg(test)]
#[path = "tag_tests.rs"]
mod tests;
