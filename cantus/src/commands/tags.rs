//! `cantus tags`: classified tag listing.

use crate::context::AppContext;
use crate::format::{self, OutputFormat};
use libcantus::{Cantus, TagEntry};
use tabled::Tabled;

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct TagRow {
    #[tabled(rename = "TAG")]
    pub name: String,
    #[tabled(rename = "TYPE")]
    pub kind: String,
}

impl From<&TagEntry> for TagRow {
    fn from(entry: &TagEntry) -> Self {
        Self {
            name: entry.name.clone(),
            kind: entry.kind.to_string(),
        }
    }
}

pub fn render_tags(tags: &[TagEntry], format: OutputFormat) -> Result<String, String> {
    format::render(tags, format, |tags| {
        let rows: Vec<TagRow> = tags.iter().map(TagRow::from).collect();
        format::table(&rows)
    })
}

/// Handle the tags command
pub async fn handle_tags(
    ctx: &AppContext,
    cantus: &Cantus,
    reference: &str,
    filter: Option<&str>,
    token: Option<&str>,
) -> Result<(), String> {
    let tags = cantus
        .tags(reference, token, filter)
        .await
        .map_err(|e| e.to_string())?;

    if tags.is_empty() && ctx.format == OutputFormat::Pretty {
        println!("No tags matching '{}' in {}.", filter.unwrap_or_default(), reference);
        return Ok(());
    }

    println!("{}", render_tags(&tags, ctx.format)?);
    Ok(())
}

#[cfg(test)]
#[path = "tags_tests.rs"]
mod tests;
