//! Rechunk command implementation.

use crate::chunking::ChunkStrategy;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the rechunk command.
pub async fn run_rechunk(
    episode: &str,
    strategy: Option<String>,
    settings: Settings,
) -> Result<()> {
    let strategy = strategy
        .map(|s| s.parse::<ChunkStrategy>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Rechunking {}...", episode));
    let result = orchestrator.rechunk_episode(episode, strategy).await;
    spinner.finish_and_clear();

    match result {
        Ok(r) => {
            Output::success(&format!(
                "Rechunked {} into {} chunks",
                r.episode, r.chunks_indexed
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Rechunk failed: {}", e));
            let available = orchestrator.list_rechunkable()?;
            if !available.is_empty() {
                Output::info("Episodes with stored transcripts:");
                for (name, _, _) in available {
                    println!("  {}", name);
                }
            }
            Err(e.into())
        }
    }
}
