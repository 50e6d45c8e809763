//! SQLite-based vector store implementation.
//!
//! Cosine similarity is computed in Rust over all stored embeddings, which
//! is fine for a personal podcast library. Larger datasets would want the
//! sqlite-vec extension or a dedicated vector database.
//!
//! The connection sits behind a mutex, so concurrent episode ingestion
//! serializes its index writes here.

use super::{cosine_similarity, Document, IndexedEpisode, SearchResult, VectorStore};
use crate::error::{Result, SkaldError};
use crate::fusion::MergedTranscript;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    episode TEXT NOT NULL,
    content TEXT NOT NULL,
    start_seconds REAL NOT NULL,
    end_seconds REAL NOT NULL,
    timestamp_start TEXT NOT NULL,
    timestamp_end TEXT NOT NULL,
    speakers TEXT NOT NULL,
    num_speakers INTEGER NOT NULL,
    embedding BLOB NOT NULL,
    chunk_order INTEGER NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_episode ON documents(episode);
CREATE INDEX IF NOT EXISTS idx_documents_indexed_at ON documents(indexed_at);

CREATE TABLE IF NOT EXISTS transcripts (
    episode TEXT PRIMARY KEY,
    transcript_json TEXT NOT NULL,
    duration_seconds REAL NOT NULL,
    num_speakers INTEGER NOT NULL,
    merged_at TEXT NOT NULL
);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL improves concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SkaldError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(9)?;
        let indexed_at_str: String = row.get(11)?;

        Ok(Document {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            episode: row.get(1)?,
            content: row.get(2)?,
            start_seconds: row.get(3)?,
            end_seconds: row.get(4)?,
            timestamp_start: row.get(5)?,
            timestamp_end: row.get(6)?,
            speakers: row.get(7)?,
            num_speakers: row.get(8)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            chunk_order: row.get(10)?,
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

const INSERT_DOCUMENT: &str = r#"
INSERT OR REPLACE INTO documents
(id, episode, content, start_seconds, end_seconds, timestamp_start, timestamp_end,
 speakers, num_speakers, embedding, chunk_order, indexed_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

const SELECT_DOCUMENT: &str = r#"
SELECT id, episode, content, start_seconds, end_seconds, timestamp_start, timestamp_end,
       speakers, num_speakers, embedding, chunk_order, indexed_at
FROM documents
"#;

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, doc))]
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let conn = self.lock()?;
        let embedding_bytes = Self::embedding_to_bytes(&doc.embedding);

        conn.execute(
            INSERT_DOCUMENT,
            params![
                doc.id.to_string(),
                doc.episode,
                doc.content,
                doc.start_seconds,
                doc.end_seconds,
                doc.timestamp_start,
                doc.timestamp_end,
                doc.speakers,
                doc.num_speakers,
                embedding_bytes,
                doc.chunk_order,
                doc.indexed_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted document {}", doc.id);
        Ok(())
    }

    #[instrument(skip(self, docs))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            let embedding_bytes = Self::embedding_to_bytes(&doc.embedding);

            tx.execute(
                INSERT_DOCUMENT,
                params![
                    doc.id.to_string(),
                    doc.episode,
                    doc.content,
                    doc.start_seconds,
                    doc.end_seconds,
                    doc.timestamp_start,
                    doc.timestamp_end,
                    doc.speakers,
                    doc.num_speakers,
                    embedding_bytes,
                    doc.chunk_order,
                    doc.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(SELECT_DOCUMENT)?;
        let docs = stmt.query_map([], Self::row_to_document)?;

        let mut results: Vec<SearchResult> = docs
            .filter_map(|doc_result| doc_result.ok())
            .map(|doc| {
                let score = cosine_similarity(query_embedding, &doc.embedding);
                SearchResult {
                    document: doc,
                    score,
                }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete_by_episode(&self, episode: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM documents WHERE episode = ?1", params![episode])?;

        info!("Deleted {} documents for episode {}", deleted, episode);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT episode, COUNT(*) as chunk_count,
                   MAX(end_seconds) as total_duration, MAX(indexed_at) as indexed_at
            FROM documents
            GROUP BY episode
            ORDER BY indexed_at DESC
            "#,
        )?;

        let episodes = stmt.query_map([], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedEpisode {
                episode: row.get(0)?,
                chunk_count: row.get(1)?,
                total_duration_seconds: row.get(2)?,
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        Ok(episodes.filter_map(|e| e.ok()).collect())
    }

    #[instrument(skip(self))]
    async fn get_episode(&self, episode: &str) -> Result<Option<IndexedEpisode>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT episode, COUNT(*) as chunk_count,
                   MAX(end_seconds) as total_duration, MAX(indexed_at) as indexed_at
            FROM documents
            WHERE episode = ?1
            GROUP BY episode
            "#,
        )?;

        let result = stmt.query_row(params![episode], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedEpisode {
                episode: row.get(0)?,
                chunk_count: row.get(1)?,
                total_duration_seconds: row.get(2)?,
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        });

        match result {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_episode_indexed(&self, episode: &str) -> Result<bool> {
        let info = self.get_episode(episode).await?;
        Ok(info.is_some())
    }

    #[instrument(skip(self))]
    async fn get_by_episode(&self, episode: &str) -> Result<Vec<Document>> {
        let conn = self.lock()?;
        let query = format!("{} WHERE episode = ?1 ORDER BY chunk_order", SELECT_DOCUMENT);
        let mut stmt = conn.prepare(&query)?;
        let docs = stmt.query_map(params![episode], Self::row_to_document)?;

        let result: Vec<Document> = docs.filter_map(|d| d.ok()).collect();
        debug!("Found {} documents for episode {}", result.len(), episode);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// Merged transcript storage (not part of the VectorStore trait); kept so
// episodes can be rechunked without re-running transcription/diarization.
impl SqliteVectorStore {
    /// Store a merged transcript for later rechunking.
    pub fn store_transcript(&self, transcript: &MergedTranscript) -> Result<()> {
        let conn = self.lock()?;

        let transcript_json = serde_json::to_string(transcript)
            .map_err(|e| SkaldError::VectorStore(format!("Failed to serialize transcript: {}", e)))?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO transcripts
            (episode, transcript_json, duration_seconds, num_speakers, merged_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                transcript.file,
                transcript_json,
                transcript.duration_seconds(),
                transcript.num_speakers,
                Utc::now().to_rfc3339(),
            ],
        )?;

        info!("Stored merged transcript for {}", transcript.file);
        Ok(())
    }

    /// Retrieve a stored merged transcript.
    pub fn get_transcript(&self, episode: &str) -> Result<Option<MergedTranscript>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT transcript_json FROM transcripts WHERE episode = ?1",
            params![episode],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(json) => {
                let transcript: MergedTranscript = serde_json::from_str(&json).map_err(|e| {
                    SkaldError::VectorStore(format!("Failed to deserialize transcript: {}", e))
                })?;
                Ok(Some(transcript))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List stored transcripts as (episode, duration, num_speakers).
    pub fn list_transcripts(&self) -> Result<Vec<(String, f64, usize)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT episode, duration_seconds, num_speakers FROM transcripts ORDER BY merged_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get::<_, i64>(2)? as usize))
        })?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document(episode: &str, order: i32, embedding: Vec<f32>) -> Document {
        Document {
            id: uuid::Uuid::new_v4(),
            episode: episode.to_string(),
            content: format!("chunk {} content", order),
            start_seconds: order as f64 * 45.0,
            end_seconds: (order + 1) as f64 * 45.0,
            timestamp_start: "00:00:00.000".to_string(),
            timestamp_end: "00:00:45.000".to_string(),
            speakers: "SPEAKER_00,SPEAKER_01".to_string(),
            num_speakers: 2,
            embedding,
            chunk_order: order,
            indexed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_vector_store_round_trip() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let doc = sample_document("ep1", 0, vec![1.0, 0.0, 0.0]);
        store.upsert(&doc).await.unwrap();

        let episodes = store.list_episodes().await.unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].episode, "ep1");

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].document.speaker_list().len(), 2);

        let deleted = store.delete_by_episode("ep1").await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.list_episodes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_episode_is_chunk_ordered() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store
            .upsert_batch(&[
                sample_document("ep1", 1, vec![0.0, 1.0]),
                sample_document("ep1", 0, vec![1.0, 0.0]),
                sample_document("ep2", 0, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let docs = store.get_by_episode("ep1").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].chunk_order, 0);
        assert_eq!(docs[1].chunk_order, 1);
    }

    #[tokio::test]
    async fn test_search_threshold_filters() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store
            .upsert_batch(&[
                sample_document("ep1", 0, vec![1.0, 0.0]),
                sample_document("ep1", 1, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = store
            .search_with_threshold(&[1.0, 0.0], 10, 0.5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_transcript_storage() {
        use crate::fusion::{MergedSegment, MergedTranscript};

        let store = SqliteVectorStore::in_memory().unwrap();
        let transcript = MergedTranscript {
            file: "ep1".to_string(),
            language: "en".to_string(),
            num_speakers: 1,
            speakers: vec!["SPEAKER_00".to_string()],
            segments: vec![MergedSegment {
                start: 0.0,
                end: 5.0,
                text: "hello".to_string(),
                speaker: "SPEAKER_00".to_string(),
                words: None,
            }],
        };

        store.store_transcript(&transcript).unwrap();

        let loaded = store.get_transcript("ep1").unwrap().unwrap();
        assert_eq!(loaded.segments.len(), 1);
        assert_eq!(loaded.num_speakers, 1);

        let listed = store.list_transcripts().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "ep1");
        assert_eq!(listed[0].1, 5.0);

        assert!(store.get_transcript("missing").unwrap().is_none());
    }
}
