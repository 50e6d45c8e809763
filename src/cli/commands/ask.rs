//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::orchestrator::Orchestrator;
use crate::rag::{ContextBuilder, RagEngine};
use anyhow::Result;
use std::sync::Arc;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    max_chunks: usize,
    episode: Option<String>,
    speaker: Option<String>,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings.clone())?;
    let model = model.unwrap_or_else(|| settings.rag.model.clone());

    let embedder = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));

    let context_builder = ContextBuilder::new(orchestrator.vector_store(), embedder)
        .with_max_chunks(max_chunks)
        .with_min_score(settings.rag.min_score)
        .with_episode_filter(episode)
        .with_speaker_filter(speaker);

    let engine = RagEngine::new(context_builder, &model)
        .with_prompts(orchestrator.prompts().clone());

    let spinner = Output::spinner("Searching knowledge base...");

    match engine.ask(question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    Output::search_result(
                        &source.episode,
                        &source.timestamp,
                        source.score,
                        &source.speakers,
                        &source.content,
                    );
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
