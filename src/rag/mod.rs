//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Answers questions from the indexed podcast library, with episode and
//! timestamp citations.

pub mod context;
mod response;
mod summarize;

pub use context::ContextBuilder;
pub use response::{RagEngine, RagResponse};
pub use summarize::Summarizer;

use crate::vector_store::SearchResult;

/// A search result with formatted context for display.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Episode name.
    pub episode: String,
    /// Formatted start timestamp (e.g., "02:34").
    pub timestamp: String,
    /// Precise timestamp range from the chunk metadata.
    pub timestamp_start: String,
    pub timestamp_end: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Speakers heard in this chunk.
    pub speakers: Vec<String>,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            episode: result.document.episode.clone(),
            timestamp: result.document.format_timestamp(),
            timestamp_start: result.document.timestamp_start.clone(),
            timestamp_end: result.document.timestamp_end.clone(),
            start_seconds: result.document.start_seconds,
            speakers: result.document.speaker_list(),
            content: result.document.content.clone(),
            score: result.score,
        }
    }
}
