//! Pipeline orchestrator for Skald.
//!
//! Coordinates one episode's journey: convert audio, run transcription and
//! diarization concurrently, fuse the two streams, chunk, embed, and index.
//! Batch ingestion parallelizes across episodes; index writes serialize on
//! the store's connection lock.

use crate::audio::{convert_to_mp3, episode_name, is_media_file};
use crate::chunking::{create_chunker, Chunk, ChunkStrategy};
use crate::config::{Prompts, Settings};
use crate::diarization::{CommandDiarizer, DiarizationResult, Diarizer};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SkaldError};
use crate::fusion::{self, MergedTranscript};
use crate::transcription::{TranscriptResult, TranscriptionEngine, WhisperEngine};
use crate::vector_store::{Document, SqliteVectorStore, VectorStore};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Per-ingestion options from the CLI.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Re-process even if the episode is already indexed.
    pub force: bool,
    /// Override the configured chunking strategy.
    pub strategy: Option<ChunkStrategy>,
    /// Use a precomputed transcription JSON instead of calling the engine.
    pub transcript_json: Option<PathBuf>,
    /// Use a precomputed diarization JSON instead of calling the engine.
    pub diarization_json: Option<PathBuf>,
}

/// Result of ingesting one episode.
#[derive(Debug)]
pub struct IngestResult {
    /// Episode identifier.
    pub episode: String,
    /// Number of chunks indexed.
    pub chunks_indexed: usize,
    /// Number of speakers found by diarization.
    pub num_speakers: usize,
    /// Whether processing was skipped (already indexed).
    pub skipped: bool,
}

/// Result of a batch ingestion run.
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// Per-episode successes.
    pub results: Vec<IngestResult>,
    /// (episode, error) pairs for failed files.
    pub failed: Vec<(String, String)>,
}

impl IngestSummary {
    /// Total chunks indexed across the batch.
    pub fn total_chunks(&self) -> usize {
        self.results.iter().map(|r| r.chunks_indexed).sum()
    }
}

/// The main orchestrator for the Skald pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    transcriber: Arc<dyn TranscriptionEngine>,
    diarizer: Arc<dyn Diarizer>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<SqliteVectorStore>,
    temp_dir: PathBuf,
}

impl Orchestrator {
    /// Create a new orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let transcriber: Arc<dyn TranscriptionEngine> = Arc::new(WhisperEngine::with_config(
            &settings.transcription.model,
            settings.transcription.chunk_duration_seconds,
            settings.transcription.max_concurrent_chunks,
        ));

        let diarizer: Arc<dyn Diarizer> = Arc::new(CommandDiarizer::new(
            &settings.diarization.command,
            settings.diarization.args.clone(),
        ));

        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let vector_store = Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?);

        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            settings,
            prompts,
            transcriber,
            diarizer,
            embedder,
            vector_store,
            temp_dir,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        transcriber: Arc<dyn TranscriptionEngine>,
        diarizer: Arc<dyn Diarizer>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<SqliteVectorStore>,
    ) -> Result<Self> {
        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            settings,
            prompts,
            transcriber,
            diarizer,
            embedder,
            vector_store,
            temp_dir,
        })
    }

    /// Get a reference to the vector store (as trait object).
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone() as Arc<dyn VectorStore>
    }

    /// Get a reference to the SQLite vector store (for transcript storage).
    pub fn sqlite_store(&self) -> Arc<SqliteVectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the loaded prompts.
    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Ingest one media file: convert, transcribe + diarize, fuse, chunk,
    /// embed, and index.
    #[instrument(skip(self, opts), fields(input = %input.display()))]
    pub async fn ingest_file(&self, input: &Path, opts: &IngestOptions) -> Result<IngestResult> {
        let episode = episode_name(input);

        if !opts.force && self.vector_store.is_episode_indexed(&episode).await? {
            info!("Episode {} is already indexed, skipping", episode);
            return Ok(IngestResult {
                episode,
                chunks_indexed: 0,
                num_speakers: 0,
                skipped: true,
            });
        }

        // Audio is only needed when at least one engine actually runs
        let audio_path = if opts.transcript_json.is_none() || opts.diarization_json.is_none() {
            info!("Preparing audio for {}", episode);
            Some(convert_to_mp3(input, &self.temp_dir, &self.settings.audio.bitrate).await?)
        } else {
            None
        };

        let language = self.settings.transcription.language.as_deref();

        let transcription_fut = async {
            match (&opts.transcript_json, &audio_path) {
                (Some(path), _) => TranscriptResult::load(path),
                (None, Some(audio)) => self.transcriber.transcribe(audio, language).await,
                (None, None) => Err(SkaldError::InvalidInput(
                    "No audio or precomputed transcript available".into(),
                )),
            }
        };

        let diarization_fut = async {
            match (&opts.diarization_json, &audio_path) {
                (Some(path), _) => DiarizationResult::load(path),
                (None, Some(audio)) => self.diarizer.diarize(audio).await,
                (None, None) => Err(SkaldError::InvalidInput(
                    "No audio or precomputed diarization available".into(),
                )),
            }
        };

        // Transcription and diarization are independent; run them together
        let (transcription, diarization) =
            futures::try_join!(transcription_fut, diarization_fut)?;

        info!(
            "Fusing {} transcript segments with {} speaker intervals",
            transcription.segments.len(),
            diarization.segments.len()
        );

        let transcript_path = self
            .settings
            .transcripts_dir()
            .join(format!("{}.json", transcription.file));
        let merged = fusion::merge_to_file(&transcription, &diarization, &transcript_path)?;

        if let Err(e) = self.vector_store.store_transcript(&merged) {
            warn!("Failed to store transcript (rechunking won't be available): {}", e);
        }

        let chunks = self.chunk_transcript(&merged, opts.strategy)?;
        info!("Created {} chunks", chunks.len());

        let indexed = self.index_chunks(&merged.file, chunks).await?;

        Ok(IngestResult {
            episode: merged.file,
            chunks_indexed: indexed,
            num_speakers: merged.num_speakers,
            skipped: false,
        })
    }

    /// Ingest every media file in a directory, processing episodes
    /// concurrently. Failures are collected per episode, not fatal to the
    /// batch.
    #[instrument(skip(self, opts), fields(dir = %dir.display()))]
    pub async fn ingest_dir(&self, dir: &Path, opts: &IngestOptions) -> Result<IngestSummary> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_media_file(path))
            .collect();
        files.sort();

        if files.is_empty() {
            warn!("No media files found in {}", dir.display());
            return Ok(IngestSummary::default());
        }

        info!("Batch ingesting {} files", files.len());

        let mut summary = IngestSummary::default();

        let mut results = stream::iter(files)
            .map(|path| {
                let opts = opts.clone();
                async move {
                    let episode = episode_name(&path);
                    (episode, self.ingest_file(&path, &opts).await)
                }
            })
            .buffer_unordered(self.settings.general.max_parallel_episodes);

        while let Some((episode, result)) = results.next().await {
            match result {
                Ok(r) => summary.results.push(r),
                Err(e) => {
                    warn!("Failed to ingest {}: {}", episode, e);
                    summary.failed.push((episode, e.to_string()));
                }
            }
        }

        info!(
            "Batch complete: {} succeeded, {} failed, {} chunks",
            summary.results.len(),
            summary.failed.len(),
            summary.total_chunks()
        );

        Ok(summary)
    }

    /// Rechunk an episode from its stored merged transcript, without
    /// re-running transcription or diarization.
    #[instrument(skip(self))]
    pub async fn rechunk_episode(
        &self,
        episode: &str,
        strategy: Option<ChunkStrategy>,
    ) -> Result<IngestResult> {
        let merged = self
            .vector_store
            .get_transcript(episode)?
            .ok_or_else(|| SkaldError::EpisodeNotFound(episode.to_string()))?;

        info!("Rechunking '{}' from stored transcript", episode);

        let chunks = self.chunk_transcript(&merged, strategy)?;
        let indexed = self.index_chunks(episode, chunks).await?;

        Ok(IngestResult {
            episode: episode.to_string(),
            chunks_indexed: indexed,
            num_speakers: merged.num_speakers,
            skipped: false,
        })
    }

    /// List episodes with stored transcripts (available for rechunking).
    pub fn list_rechunkable(&self) -> Result<Vec<(String, f64, usize)>> {
        self.vector_store.list_transcripts()
    }

    /// Chunk a merged transcript with the configured or overridden strategy.
    fn chunk_transcript(
        &self,
        merged: &MergedTranscript,
        strategy: Option<ChunkStrategy>,
    ) -> Result<Vec<Chunk>> {
        let strategy = match strategy {
            Some(s) => s,
            None => self
                .settings
                .chunking
                .strategy
                .parse()
                .unwrap_or(ChunkStrategy::Duration),
        };

        let chunker = create_chunker(strategy);
        chunker.chunk(merged, &self.settings.chunking_config())
    }

    /// Generate embeddings and index chunks, replacing any previous index
    /// entries for the episode.
    async fn index_chunks(&self, episode: &str, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        self.vector_store.delete_by_episode(episode).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let documents: Vec<Document> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::from_chunk(chunk, embedding))
            .collect();

        self.vector_store.upsert_batch(&documents).await
    }
}
