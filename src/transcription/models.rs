//! Data models for transcription engine output.
//!
//! These types mirror the JSON the transcription collaborator produces:
//! `{file, language, segments: [{start, end, text, words?}]}`. They are
//! read-only inputs to fusion; Skald never mutates them after loading.

use crate::error::{Result, SkaldError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single word with timing, when the backend provides word granularity.
///
/// Some backends omit timestamps for individual words; fusion falls back to
/// the enclosing segment's bounds in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordSpan {
    /// The word text.
    pub word: String,
    /// Start time in seconds, if the backend reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    /// End time in seconds, if the backend reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

/// A single time-stamped text segment from the transcription engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Transcribed text content.
    pub text: String,
    /// Word-level timestamps, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordSpan>>,
}

impl TranscriptSegment {
    /// Create a segment without word-level detail.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            words: None,
        }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Complete output of one transcription run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Source file name (episode identifier).
    pub file: String,
    /// Detected or requested language code.
    pub language: String,
    /// Time-ordered transcript segments.
    pub segments: Vec<TranscriptSegment>,
}

impl TranscriptResult {
    /// Create a new transcription result.
    pub fn new(
        file: impl Into<String>,
        language: impl Into<String>,
        segments: Vec<TranscriptSegment>,
    ) -> Self {
        Self {
            file: file.into(),
            language: language.into(),
            segments,
        }
    }

    /// Load a precomputed transcription result from a JSON file.
    ///
    /// A missing file is a `MissingData` error; a file without the required
    /// keys fails deserialization and propagates as a JSON error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkaldError::MissingData(format!(
                "Transcription file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save this result as pretty-printed JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Total duration in seconds, taken from the last segment.
    pub fn duration_seconds(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_duration() {
        let seg = TranscriptSegment::new(1.5, 4.0, "hello");
        assert!((seg.duration() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_words_optional_in_json() {
        let json = r#"{"start": 0.0, "end": 2.0, "text": "hi"}"#;
        let seg: TranscriptSegment = serde_json::from_str(json).unwrap();
        assert!(seg.words.is_none());

        let json = r#"{"start": 0.0, "end": 2.0, "text": "hi", "words": [{"word": "hi"}]}"#;
        let seg: TranscriptSegment = serde_json::from_str(json).unwrap();
        let words = seg.words.unwrap();
        assert_eq!(words[0].word, "hi");
        assert!(words[0].start.is_none());
    }

    #[test]
    fn test_missing_segments_key_fails() {
        let json = r#"{"file": "ep.mp3", "language": "en"}"#;
        assert!(serde_json::from_str::<TranscriptResult>(json).is_err());
    }

    #[test]
    fn test_duration_from_last_segment() {
        let result = TranscriptResult::new(
            "ep.mp3",
            "en",
            vec![
                TranscriptSegment::new(0.0, 5.0, "a"),
                TranscriptSegment::new(5.0, 12.5, "b"),
            ],
        );
        assert_eq!(result.duration_seconds(), 12.5);
    }
}
