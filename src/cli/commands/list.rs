//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let episodes = orchestrator.vector_store().list_episodes().await?;

    if episodes.is_empty() {
        Output::info("No episodes indexed yet. Run 'skald ingest <file>' to get started.");
        return Ok(());
    }

    Output::header(&format!("Indexed episodes ({})", episodes.len()));
    for episode in &episodes {
        Output::episode_info(
            &episode.episode,
            episode.chunk_count,
            episode.total_duration_seconds,
        );
    }

    Ok(())
}
