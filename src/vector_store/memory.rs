//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{cosine_similarity, Document, IndexedEpisode, SearchResult, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let mut docs = self.documents.write().unwrap();
        docs.insert(doc.id.to_string(), doc.clone());
        Ok(())
    }

    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.documents.write().unwrap();
        for doc in docs {
            store.insert(doc.id.to_string(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().unwrap();

        let mut results: Vec<SearchResult> = docs
            .values()
            .map(|doc| {
                let score = cosine_similarity(query_embedding, &doc.embedding);
                SearchResult {
                    document: doc.clone(),
                    score,
                }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn delete_by_episode(&self, episode: &str) -> Result<usize> {
        let mut docs = self.documents.write().unwrap();
        let initial_len = docs.len();
        docs.retain(|_, doc| doc.episode != episode);
        Ok(initial_len - docs.len())
    }

    async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>> {
        let docs = self.documents.read().unwrap();

        let mut episode_map: HashMap<String, IndexedEpisode> = HashMap::new();

        for doc in docs.values() {
            let entry = episode_map
                .entry(doc.episode.clone())
                .or_insert_with(|| IndexedEpisode {
                    episode: doc.episode.clone(),
                    chunk_count: 0,
                    total_duration_seconds: 0.0,
                    indexed_at: doc.indexed_at,
                });

            entry.chunk_count += 1;
            if doc.end_seconds > entry.total_duration_seconds {
                entry.total_duration_seconds = doc.end_seconds;
            }
            if doc.indexed_at > entry.indexed_at {
                entry.indexed_at = doc.indexed_at;
            }
        }

        let mut episodes: Vec<IndexedEpisode> = episode_map.into_values().collect();
        episodes.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));

        Ok(episodes)
    }

    async fn get_episode(&self, episode: &str) -> Result<Option<IndexedEpisode>> {
        let episodes = self.list_episodes().await?;
        Ok(episodes.into_iter().find(|e| e.episode == episode))
    }

    async fn is_episode_indexed(&self, episode: &str) -> Result<bool> {
        let docs = self.documents.read().unwrap();
        Ok(docs.values().any(|d| d.episode == episode))
    }

    async fn get_by_episode(&self, episode: &str) -> Result<Vec<Document>> {
        let docs = self.documents.read().unwrap();
        let mut result: Vec<Document> = docs
            .values()
            .filter(|d| d.episode == episode)
            .cloned()
            .collect();
        result.sort_by_key(|d| d.chunk_order);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        let docs = self.documents.read().unwrap();
        Ok(docs.len())
    }
}
