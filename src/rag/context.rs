//! Context building for RAG responses.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds context from search results for RAG.
///
/// Optional episode and speaker filters narrow results after similarity
/// search, mirroring metadata filtering in the underlying store.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
    min_score: f32,
    episode_filter: Option<String>,
    speaker_filter: Option<String>,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_chunks: 5,
            min_score: 0.0,
            episode_filter: None,
            speaker_filter: None,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Restrict results to a single episode.
    pub fn with_episode_filter(mut self, episode: Option<String>) -> Self {
        self.episode_filter = episode;
        self
    }

    /// Restrict results to chunks featuring a speaker label.
    pub fn with_speaker_filter(mut self, speaker: Option<String>) -> Self {
        self.speaker_filter = speaker;
        self
    }

    /// Build context for a query.
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        // Over-fetch when filtering so post-filter results still fill the
        // requested count
        let fetch_limit = if self.episode_filter.is_some() || self.speaker_filter.is_some() {
            self.max_chunks * 4
        } else {
            self.max_chunks
        };

        let results = self
            .vector_store
            .search_with_threshold(&query_embedding, fetch_limit, self.min_score)
            .await?;

        let chunks: Vec<ContextChunk> = results
            .into_iter()
            .map(ContextChunk::from)
            .filter(|c| {
                self.episode_filter
                    .as_ref()
                    .map(|e| &c.episode == e)
                    .unwrap_or(true)
            })
            .filter(|c| {
                self.speaker_filter
                    .as_ref()
                    .map(|s| c.speakers.iter().any(|label| label == s))
                    .unwrap_or(true)
            })
            .take(self.max_chunks)
            .collect();

        let episodes: std::collections::HashSet<&str> =
            chunks.iter().map(|c| c.episode.as_str()).collect();
        info!(
            "Retrieved {} results from {} episode(s)",
            chunks.len(),
            episodes.len()
        );
        debug!("Query: '{}'", query);

        Ok(chunks)
    }
}

/// Format context chunks for the LLM prompt, with source attribution.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[Source {} - From: {}]\nTimestamp: {} - {}\nSpeakers: {}\nRelevance: {:.0}%\nContent: {}",
                i + 1,
                chunk.episode,
                chunk.timestamp_start,
                chunk.timestamp_end,
                chunk.speakers.join(", "),
                chunk.score * 100.0,
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format context chunks for display to the user.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "{} @ {} (score: {:.2}) [{}]",
                chunk.episode,
                chunk.timestamp,
                chunk.score,
                chunk.speakers.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(episode: &str, speakers: &[&str], score: f32) -> ContextChunk {
        ContextChunk {
            episode: episode.to_string(),
            timestamp: "02:05".to_string(),
            timestamp_start: "00:02:05.000".to_string(),
            timestamp_end: "00:02:50.000".to_string(),
            start_seconds: 125.0,
            speakers: speakers.iter().map(|s| s.to_string()).collect(),
            content: "Some discussion.".to_string(),
            score,
        }
    }

    #[test]
    fn test_format_context_for_prompt() {
        let chunks = vec![chunk("ep1", &["SPEAKER_00", "SPEAKER_01"], 0.85)];
        let formatted = format_context_for_prompt(&chunks);

        assert!(formatted.contains("[Source 1 - From: ep1]"));
        assert!(formatted.contains("Timestamp: 00:02:05.000 - 00:02:50.000"));
        assert!(formatted.contains("Speakers: SPEAKER_00, SPEAKER_01"));
        assert!(formatted.contains("Relevance: 85%"));
    }

    #[test]
    fn test_format_context_for_display() {
        let chunks = vec![chunk("ep1", &["SPEAKER_00"], 0.72)];
        let formatted = format_context_for_display(&chunks);
        assert!(formatted.contains("ep1 @ 02:05"));
        assert!(formatted.contains("0.72"));
    }
}
