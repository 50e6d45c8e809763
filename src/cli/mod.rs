//! CLI module for Skald.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Skald - Podcast Transcription, Diarization and RAG
///
/// A local-first CLI tool that turns podcast audio into speaker-attributed
/// transcripts and a searchable knowledge base. The name "Skald" is the Old
/// Norse word for a storytelling poet.
#[derive(Parser, Debug)]
#[command(name = "skald")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe, diarize and index audio/video content
    Ingest {
        /// Media file or directory of media files
        input: String,

        /// Force re-processing even if already indexed
        #[arg(short, long)]
        force: bool,

        /// Chunking strategy (duration, turns)
        #[arg(long)]
        strategy: Option<String>,

        /// Precomputed transcription JSON (skips the transcription engine)
        #[arg(long)]
        transcript: Option<String>,

        /// Precomputed diarization JSON (skips the diarization engine)
        #[arg(long)]
        diarization: Option<String>,
    },

    /// Ask a question and get an answer from your podcast library
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of context chunks to include
        #[arg(short = 'c', long, default_value = "5")]
        max_chunks: usize,

        /// Only use context from this episode
        #[arg(short, long)]
        episode: Option<String>,

        /// Only use chunks featuring this speaker label
        #[arg(short, long)]
        speaker: Option<String>,
    },

    /// Search for relevant transcript chunks
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long, default_value = "0.3")]
        min_score: f32,

        /// Only search within this episode
        #[arg(short, long)]
        episode: Option<String>,

        /// Only return chunks featuring this speaker label
        #[arg(long)]
        speaker: Option<String>,
    },

    /// Generate a markdown summary of an indexed episode
    Summarize {
        /// Episode to summarize
        episode: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List indexed episodes
    List,

    /// Rechunk an indexed episode without re-transcribing
    Rechunk {
        /// Episode to rechunk
        episode: String,

        /// Chunking strategy (duration, turns)
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Export a merged transcript
    Export {
        /// Episode to export
        episode: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (json, srt, vtt)
        #[arg(long, default_value = "json")]
        format: String,
    },
}
