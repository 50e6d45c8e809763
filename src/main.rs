//! Skald CLI entry point.

use anyhow::Result;
use clap::Parser;
use skald::cli::{commands, Cli, Commands};
use skald::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("skald={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.transcripts_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Ingest {
            input,
            force,
            strategy,
            transcript,
            diarization,
        } => {
            commands::run_ingest(
                input,
                *force,
                strategy.clone(),
                transcript.clone(),
                diarization.clone(),
                settings,
            )
            .await?;
        }

        Commands::Ask {
            question,
            model,
            max_chunks,
            episode,
            speaker,
        } => {
            commands::run_ask(
                question,
                model.clone(),
                *max_chunks,
                episode.clone(),
                speaker.clone(),
                settings,
            )
            .await?;
        }

        Commands::Search {
            query,
            limit,
            min_score,
            episode,
            speaker,
        } => {
            commands::run_search(
                query,
                *limit,
                *min_score,
                episode.clone(),
                speaker.clone(),
                settings,
            )
            .await?;
        }

        Commands::Summarize {
            episode,
            model,
            output,
        } => {
            commands::run_summarize(episode, model.clone(), output.clone(), settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Rechunk { episode, strategy } => {
            commands::run_rechunk(episode, strategy.clone(), settings).await?;
        }

        Commands::Export {
            episode,
            output,
            format,
        } => {
            commands::run_export(episode, output.clone(), format, settings).await?;
        }
    }

    Ok(())
}
