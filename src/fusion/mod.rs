//! Transcript–diarization fusion.
//!
//! Reconciles two independently-produced time series — text segments from
//! the transcription engine and speaker intervals from the diarization
//! engine — into a single speaker-labeled transcript. Matching is
//! overlap-based: a segment gets the label of the interval it shares the
//! most time with, never point-in-time containment.
//!
//! The merged transcript is the canonical artifact the rest of the pipeline
//! (chunking, indexing, summarization) consumes.

mod format;

pub use format::{format_merged, OutputFormat};

use crate::diarization::{DiarizationResult, SpeakerInterval};
use crate::error::{Result, SkaldError};
use crate::transcription::TranscriptResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

/// Label assigned when no diarization interval overlaps a segment.
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// Find the speaker for a time interval using overlap-based matching.
///
/// Scans every candidate interval and keeps the one with the strictly
/// greatest temporal overlap; ties keep the first-seen candidate, so the
/// result is deterministic for a given interval ordering. Returns
/// [`UNKNOWN_SPEAKER`] when nothing overlaps at all.
pub fn find_speaker(
    segment_start: f64,
    segment_end: f64,
    speaker_intervals: &[SpeakerInterval],
) -> String {
    let mut max_overlap = 0.0_f64;
    let mut best_speaker: Option<&str> = None;

    for interval in speaker_intervals {
        let overlap_start = segment_start.max(interval.start);
        let overlap_end = segment_end.min(interval.end);
        let overlap = (overlap_end - overlap_start).max(0.0);

        if overlap > max_overlap {
            max_overlap = overlap;
            best_speaker = Some(&interval.speaker);
        }
    }

    best_speaker.unwrap_or(UNKNOWN_SPEAKER).to_string()
}

/// A word with its own resolved speaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedWord {
    /// The word text.
    pub word: String,
    /// Start time in seconds, 3-decimal precision.
    pub start: f64,
    /// End time in seconds, 3-decimal precision.
    pub end: f64,
    /// Speaker label resolved against the word's own interval.
    pub speaker: String,
}

/// A transcript segment with its resolved speaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedSegment {
    /// Start time in seconds, 3-decimal precision.
    pub start: f64,
    /// End time in seconds, 3-decimal precision.
    pub end: f64,
    /// Trimmed segment text.
    pub text: String,
    /// Speaker label, or "UNKNOWN" when no interval overlapped.
    pub speaker: String,
    /// Word-level speakers, when the transcription had word timestamps.
    /// These may legitimately differ from the segment label when a speaker
    /// change happens mid-segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<MergedWord>>,
}

/// A complete speaker-attributed transcript for one episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedTranscript {
    /// Episode file name.
    pub file: String,
    /// Detected language code.
    pub language: String,
    /// Number of distinct speakers, from the diarization inventory.
    pub num_speakers: usize,
    /// Speaker inventory, from diarization (authoritative even when some
    /// segments resolve to "UNKNOWN").
    pub speakers: Vec<String>,
    /// Speaker-labeled segments, same order and count as the transcription.
    pub segments: Vec<MergedSegment>,
}

impl MergedTranscript {
    /// Load a merged transcript from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkaldError::MissingData(format!(
                "Merged transcript not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save this transcript as pretty-printed JSON.
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

/// Round to 3 decimal places, half away from zero.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Merge a transcription result with a diarization result.
///
/// Cardinality-preserving: exactly one [`MergedSegment`] per input segment,
/// in the original order. Speaker inventory is copied from the diarization
/// input, not recomputed from the merged output.
#[instrument(skip_all, fields(file = %transcription.file))]
pub fn merge(
    transcription: &TranscriptResult,
    diarization: &DiarizationResult,
) -> MergedTranscript {
    let speaker_intervals = &diarization.segments;

    let merged_segments: Vec<MergedSegment> = transcription
        .segments
        .iter()
        .map(|segment| {
            let speaker = find_speaker(segment.start, segment.end, speaker_intervals);

            let words = segment.words.as_ref().map(|words| {
                words
                    .iter()
                    .map(|word| {
                        // Words without their own timestamps inherit the
                        // enclosing segment's bounds.
                        let word_start = word.start.unwrap_or(segment.start);
                        let word_end = word.end.unwrap_or(segment.end);
                        let word_speaker =
                            find_speaker(word_start, word_end, speaker_intervals);

                        MergedWord {
                            word: word.word.clone(),
                            start: round3(word_start),
                            end: round3(word_end),
                            speaker: word_speaker,
                        }
                    })
                    .collect()
            });

            MergedSegment {
                start: round3(segment.start),
                end: round3(segment.end),
                text: segment.text.trim().to_string(),
                speaker,
                words,
            }
        })
        .collect();

    info!("Merge complete: {} segments", merged_segments.len());

    MergedTranscript {
        file: transcription.file.clone(),
        language: transcription.language.clone(),
        num_speakers: diarization.num_speakers,
        speakers: diarization.speakers.clone(),
        segments: merged_segments,
    }
}

/// Merge and persist the result in one step.
///
/// Write failures propagate; the merged transcript is not returned partially.
pub fn merge_to_file(
    transcription: &TranscriptResult,
    diarization: &DiarizationResult,
    output_path: &Path,
) -> Result<MergedTranscript> {
    let merged = merge(transcription, diarization);
    merged.save_to(output_path)?;
    info!("Saved merged transcript to {}", output_path.display());
    Ok(merged)
}
