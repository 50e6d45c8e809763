//! Transcription engine integration.
//!
//! The engine itself is an external collaborator; Skald only depends on the
//! shape of its output (`TranscriptResult`). The default implementation
//! calls OpenAI Whisper, but a precomputed JSON file (e.g. WhisperX output)
//! can be loaded instead via `TranscriptResult::load`.

mod models;
mod whisper;

pub use models::{TranscriptResult, TranscriptSegment, WordSpan};
pub use whisper::{is_api_key_configured, WhisperEngine};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe an audio file, optionally with a language hint.
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<TranscriptResult>;
}
