//! Ingest command implementation.

use crate::chunking::ChunkStrategy;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{IngestOptions, Orchestrator};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the ingest command on a file or directory.
pub async fn run_ingest(
    input: &str,
    force: bool,
    strategy: Option<String>,
    transcript: Option<String>,
    diarization: Option<String>,
    settings: Settings,
) -> Result<()> {
    let strategy = strategy
        .map(|s| s.parse::<ChunkStrategy>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let opts = IngestOptions {
        force,
        strategy,
        transcript_json: transcript.map(PathBuf::from),
        diarization_json: diarization.map(PathBuf::from),
    };

    let orchestrator = Orchestrator::new(settings)?;
    let input_path = Path::new(input);

    if input_path.is_dir() {
        Output::info(&format!("Ingesting directory {}", input));

        let summary = orchestrator.ingest_dir(input_path, &opts).await?;

        for result in &summary.results {
            if result.skipped {
                Output::info(&format!("{}: already indexed, skipped", result.episode));
            } else {
                Output::success(&format!(
                    "{}: {} chunks, {} speakers",
                    result.episode, result.chunks_indexed, result.num_speakers
                ));
            }
        }
        for (episode, error) in &summary.failed {
            Output::error(&format!("{}: {}", episode, error));
        }

        Output::success(&format!(
            "Batch complete: {} episodes, {} chunks indexed, {} failed",
            summary.results.len(),
            summary.total_chunks(),
            summary.failed.len()
        ));
    } else {
        Output::info(&format!("Ingesting {}", input));

        let result = orchestrator.ingest_file(input_path, &opts).await?;

        if result.skipped {
            Output::info(&format!(
                "{} is already indexed. Use --force to re-process.",
                result.episode
            ));
        } else {
            Output::success(&format!(
                "Indexed {} chunks from {} ({} speakers)",
                result.chunks_indexed, result.episode, result.num_speakers
            ));
        }
    }

    Ok(())
}
