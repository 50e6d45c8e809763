//! Vector store abstraction for Skald.
//!
//! Provides a trait-based interface over different backends. The store is
//! always constructed explicitly and passed in as a dependency; there is no
//! module-level client state.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::Chunk;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk stored in the vector database.
///
/// Speaker lists are flattened to a comma-joined string because metadata
/// values must be scalar; [`Document::speaker_list`] restores the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Episode this chunk belongs to.
    pub episode: String,
    /// Chunk text.
    pub content: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Start formatted as HH:MM:SS.mmm.
    pub timestamp_start: String,
    /// End formatted as HH:MM:SS.mmm.
    pub timestamp_end: String,
    /// Comma-joined speaker labels, first-appearance order.
    pub speakers: String,
    /// Number of distinct speakers in this chunk.
    pub num_speakers: u32,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Chunk order within the episode (chunk_id).
    pub chunk_order: i32,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Build a document from a chunk and its embedding.
    pub fn from_chunk(chunk: &Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            episode: chunk.episode.clone(),
            content: chunk.text.clone(),
            start_seconds: chunk.start,
            end_seconds: chunk.end,
            timestamp_start: chunk.timestamp_start.clone(),
            timestamp_end: chunk.timestamp_end.clone(),
            speakers: chunk.speakers.join(","),
            num_speakers: chunk.speakers.len() as u32,
            embedding,
            chunk_order: chunk.chunk_id as i32,
            indexed_at: Utc::now(),
        }
    }

    /// Restore the speaker list from the flattened metadata value.
    pub fn speaker_list(&self) -> Vec<String> {
        if self.speakers.is_empty() {
            return Vec::new();
        }
        self.speakers.split(',').map(String::from).collect()
    }

    /// Format the start time for display (MM:SS or HH:MM:SS).
    pub fn format_timestamp(&self) -> String {
        let total_seconds = self.start_seconds as u32;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{:02}:{:02}", minutes, secs)
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedEpisode {
    /// Episode name.
    pub episode: String,
    /// Number of indexed chunks.
    pub chunk_count: u32,
    /// Total duration in seconds.
    pub total_duration_seconds: f64,
    /// When the episode was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a document with its embedding.
    async fn upsert(&self, doc: &Document) -> Result<()>;

    /// Bulk upsert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Search for similar documents.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Delete documents by episode.
    async fn delete_by_episode(&self, episode: &str) -> Result<usize>;

    /// List all indexed episodes.
    async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>>;

    /// Get a specific episode's information.
    async fn get_episode(&self, episode: &str) -> Result<Option<IndexedEpisode>>;

    /// Check if an episode is indexed.
    async fn is_episode_indexed(&self, episode: &str) -> Result<bool>;

    /// Get all documents for an episode, in chunk order.
    async fn get_by_episode(&self, episode: &str) -> Result<Vec<Document>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    fn sample_chunk() -> Chunk {
        serde_json::from_value(serde_json::json!({
            "chunk_id": 2,
            "text": "some chunk text",
            "start": 125.0,
            "end": 170.5,
            "timestamp_start": "00:02:05.000",
            "timestamp_end": "00:02:50.500",
            "duration": 45.5,
            "speakers": ["SPEAKER_01", "SPEAKER_00"],
            "episode": "ep1",
            "num_segments": 4
        }))
        .unwrap()
    }

    #[test]
    fn test_document_from_chunk_flattens_speakers() {
        let doc = Document::from_chunk(&sample_chunk(), vec![0.1, 0.2]);

        assert_eq!(doc.episode, "ep1");
        assert_eq!(doc.speakers, "SPEAKER_01,SPEAKER_00");
        assert_eq!(doc.num_speakers, 2);
        assert_eq!(doc.chunk_order, 2);
        // Round trip back to a list
        assert_eq!(doc.speaker_list(), vec!["SPEAKER_01", "SPEAKER_00"]);
    }

    #[test]
    fn test_document_timestamp_format() {
        let doc = Document::from_chunk(&sample_chunk(), vec![]);
        assert_eq!(doc.format_timestamp(), "02:05");
    }
}
