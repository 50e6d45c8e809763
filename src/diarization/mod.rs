//! Speaker diarization integration.
//!
//! Diarization itself runs outside Skald (typically a pyannote pipeline);
//! this module defines the output shape the core consumes and two ways of
//! obtaining it: running a configured external command that prints the
//! result JSON on stdout, or loading a precomputed JSON file.
//!
//! Speaker labels are opaque, anonymous tokens such as `SPEAKER_00`.
//! Skald never attempts identity resolution.

use crate::error::{Result, SkaldError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// A speaker-turn interval produced by the diarization engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerInterval {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Anonymous speaker label (e.g. "SPEAKER_00").
    pub speaker: String,
}

impl SpeakerInterval {
    /// Create a new interval.
    pub fn new(start: f64, end: f64, speaker: impl Into<String>) -> Self {
        Self {
            start,
            end,
            speaker: speaker.into(),
        }
    }
}

/// Complete output of one diarization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationResult {
    /// Source file name (episode identifier).
    pub file: String,
    /// Number of distinct speaker labels.
    pub num_speakers: usize,
    /// Unique speaker labels, sorted lexicographically.
    pub speakers: Vec<String>,
    /// Time-ordered speaker intervals.
    pub segments: Vec<SpeakerInterval>,
}

impl DiarizationResult {
    /// Build a result from raw intervals, computing the speaker inventory.
    ///
    /// The inventory is sorted lexicographically so output is deterministic
    /// regardless of interval ordering.
    pub fn from_intervals(file: impl Into<String>, segments: Vec<SpeakerInterval>) -> Self {
        let unique: BTreeSet<&str> = segments.iter().map(|s| s.speaker.as_str()).collect();
        let speakers: Vec<String> = unique.into_iter().map(String::from).collect();

        Self {
            file: file.into(),
            num_speakers: speakers.len(),
            speakers,
            segments,
        }
    }

    /// Load a precomputed diarization result from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkaldError::MissingData(format!(
                "Diarization file not found: {}",
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
}

/// Trait for diarization services.
#[async_trait]
pub trait Diarizer: Send + Sync {
    /// Diarize an audio file into speaker-labeled intervals.
    async fn diarize(&self, audio_path: &Path) -> Result<DiarizationResult>;
}

/// Diarizer that shells out to an external tool.
///
/// The tool receives the audio path as its final argument and must print a
/// `DiarizationResult` JSON object on stdout.
pub struct CommandDiarizer {
    command: String,
    args: Vec<String>,
}

impl CommandDiarizer {
    /// Create a diarizer for the given command and fixed arguments.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

#[async_trait]
impl Diarizer for CommandDiarizer {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn diarize(&self, audio_path: &Path) -> Result<DiarizationResult> {
        info!("Running diarization: {}", self.command);

        let result = Command::new(&self.command)
            .args(&self.args)
            .arg(audio_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SkaldError::ToolNotFound(self.command.clone()));
            }
            Err(e) => {
                return Err(SkaldError::Diarization(format!(
                    "{} execution failed: {e}",
                    self.command
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SkaldError::ToolFailed(format!(
                "{} failed: {stderr}",
                self.command
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result: DiarizationResult = serde_json::from_str(&stdout).map_err(|e| {
            SkaldError::Diarization(format!("Invalid diarization output: {e}"))
        })?;

        debug!(
            "Diarization complete: {} speakers, {} intervals",
            result.num_speakers,
            result.segments.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_intervals_computes_inventory() {
        let result = DiarizationResult::from_intervals(
            "ep.mp3",
            vec![
                SpeakerInterval::new(0.0, 5.0, "SPEAKER_01"),
                SpeakerInterval::new(5.0, 9.0, "SPEAKER_00"),
                SpeakerInterval::new(9.0, 12.0, "SPEAKER_01"),
            ],
        );

        assert_eq!(result.num_speakers, 2);
        assert_eq!(result.speakers, vec!["SPEAKER_00", "SPEAKER_01"]);
        assert_eq!(result.segments.len(), 3);
    }

    #[test]
    fn test_empty_intervals() {
        let result = DiarizationResult::from_intervals("ep.mp3", Vec::new());
        assert_eq!(result.num_speakers, 0);
        assert!(result.speakers.is_empty());
    }

    #[test]
    fn test_missing_segments_key_fails() {
        let json = r#"{"file": "ep.mp3", "num_speakers": 1, "speakers": ["SPEAKER_00"]}"#;
        assert!(serde_json::from_str::<DiarizationResult>(json).is_err());
    }
}
