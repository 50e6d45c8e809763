//! Export command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::SkaldError;
use crate::fusion::{format_merged, OutputFormat};
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Run the export command.
pub async fn run_export(
    episode: &str,
    output: Option<String>,
    format: &str,
    settings: Settings,
) -> Result<()> {
    let format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let orchestrator = Orchestrator::new(settings)?;

    let transcript = orchestrator
        .sqlite_store()
        .get_transcript(episode)?
        .ok_or_else(|| SkaldError::EpisodeNotFound(episode.to_string()))?;

    let formatted = format_merged(&transcript, format);

    match output {
        Some(path) => {
            let path = Path::new(&path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &formatted)?;
            Output::success(&format!("Exported transcript to {}", path.display()));
        }
        None => print!("{}", formatted),
    }

    Ok(())
}
