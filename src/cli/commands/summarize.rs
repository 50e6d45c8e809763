//! Summarize command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::SkaldError;
use crate::orchestrator::Orchestrator;
use crate::rag::Summarizer;
use anyhow::Result;
use std::path::Path;

/// Run the summarize command.
pub async fn run_summarize(
    episode: &str,
    model: Option<String>,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings.clone())?;
    let model = model.unwrap_or_else(|| settings.rag.model.clone());

    let transcript = orchestrator
        .sqlite_store()
        .get_transcript(episode)?
        .ok_or_else(|| SkaldError::EpisodeNotFound(episode.to_string()))?;

    let summarizer = Summarizer::new(&model).with_prompts(orchestrator.prompts().clone());

    let spinner = Output::spinner("Generating summary...");
    let summary = summarizer.summarize(&transcript).await;
    spinner.finish_and_clear();

    match summary {
        Ok(text) => {
            match output {
                Some(path) => {
                    let path = Path::new(&path);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, &text)?;
                    Output::success(&format!("Summary written to {}", path.display()));
                }
                None => println!("{}", text),
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Summarization failed: {}", e));
            Err(e.into())
        }
    }
}
