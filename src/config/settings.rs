//! Configuration settings for Skald.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub audio: AudioSettings,
    pub transcription: TranscriptionSettings,
    pub diarization: DiarizationSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Maximum episodes processed concurrently during batch ingestion.
    pub max_parallel_episodes: usize,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.skald".to_string(),
            temp_dir: "/tmp/skald".to_string(),
            log_level: "info".to_string(),
            max_parallel_episodes: 2,
        }
    }
}

/// Audio conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// MP3 bitrate for converted audio.
    pub bitrate: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            bitrate: "192k".to_string(),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Language code, or None for auto-detect.
    pub language: Option<String>,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent part uploads.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 3,
        }
    }
}

/// Diarization service settings.
///
/// The engine is an external tool (e.g. a pyannote wrapper script) that
/// receives the audio path as its final argument and prints the diarization
/// result JSON on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiarizationSettings {
    /// Command to run.
    pub command: String,
    /// Fixed arguments placed before the audio path.
    pub args: Vec<String>,
}

impl Default for DiarizationSettings {
    fn default() -> Self {
        Self {
            command: "skald-diarize".to_string(),
            args: Vec::new(),
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Chunking strategy (duration, turns).
    pub strategy: String,
    /// Target duration per chunk in seconds.
    pub chunk_duration_seconds: f64,
    /// Overlap between adjacent chunks in seconds.
    pub chunk_overlap_seconds: f64,
    /// Minimum characters per chunk.
    pub min_chunk_chars: usize,
    /// Maximum duration of a single speaker turn (turns strategy).
    pub max_turn_seconds: f64,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: "duration".to_string(),
            chunk_duration_seconds: 45.0,
            chunk_overlap_seconds: 5.0,
            min_chunk_chars: 50,
            max_turn_seconds: 60.0,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.skald/vectors.db".to_string(),
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Enable RAG responses.
    pub enabled: bool,
    /// LLM model for response generation.
    pub model: String,
    /// Maximum number of context chunks to include.
    pub max_context_chunks: u32,
    /// Minimum similarity score for retrieved chunks.
    pub min_score: f32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".to_string(),
            max_context_chunks: 5,
            min_score: 0.3,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SkaldError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skald")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the directory where merged transcripts are written.
    pub fn transcripts_dir(&self) -> PathBuf {
        self.data_dir().join("transcripts")
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Build a chunking config from these settings.
    pub fn chunking_config(&self) -> crate::chunking::ChunkingConfig {
        crate::chunking::ChunkingConfig {
            chunk_duration: self.chunking.chunk_duration_seconds,
            chunk_overlap: self.chunking.chunk_overlap_seconds,
            min_chunk_chars: self.chunking.min_chunk_chars,
            max_turn_duration: self.chunking.max_turn_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_duration_seconds, 45.0);
        assert_eq!(settings.chunking.chunk_overlap_seconds, 5.0);
        assert_eq!(settings.chunking.min_chunk_chars, 50);
        assert_eq!(settings.chunking.max_turn_seconds, 60.0);
        assert_eq!(settings.rag.max_context_chunks, 5);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [chunking]
            chunk_duration_seconds = 90.0
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.chunking.chunk_duration_seconds, 90.0);
        assert_eq!(settings.chunking.chunk_overlap_seconds, 5.0);
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
    }
}
