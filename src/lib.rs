//! Skald - Podcast Transcription, Diarization and RAG
//!
//! A local-first CLI tool for turning podcast audio into speaker-attributed
//! transcripts and a searchable knowledge base.
//!
//! The name "Skald" is the Old Norse word for a storytelling poet.
//!
//! # Overview
//!
//! Skald allows you to:
//! - Transcribe local podcast audio/video files
//! - Attach anonymous speaker labels by fusing transcription with diarization
//! - Chunk fused transcripts into a searchable vector database
//! - Ask questions and get answers with episode and timestamp citations
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `audio` - Audio conversion and splitting (ffmpeg)
//! - `transcription` - Speech-to-text engine integration
//! - `diarization` - Speaker diarization engine integration
//! - `fusion` - Transcript–diarization fusion (the core)
//! - `chunking` - Chunking strategies for retrieval
//! - `timestamp` - Clock-style timestamp conversion
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `rag` - Question answering and summarization
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use skald::config::Settings;
//! use skald::orchestrator::{IngestOptions, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator
//!         .ingest_file("episode_01.mp3".as_ref(), &IngestOptions::default())
//!         .await?;
//!     println!("Indexed {} chunks", result.chunks_indexed);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod diarization;
pub mod embedding;
pub mod error;
pub mod fusion;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod timestamp;
pub mod transcription;
pub mod vector_store;

pub use error::{Result, SkaldError};
