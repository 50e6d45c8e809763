//! Transcript chunking strategies for retrieval.
//!
//! Re-segments a merged transcript into retrieval-sized chunks. Two
//! strategies are provided: duration-bounded chunks with overlap between
//! neighbors (the default), and speaker-turn chunks that follow contiguous
//! same-speaker runs.

mod duration;
mod turns;

pub use duration::DurationChunker;
pub use turns::TurnChunker;

use crate::error::Result;
use crate::fusion::MergedTranscript;
use crate::timestamp::seconds_to_timestamp;
use serde::{Deserialize, Serialize};

/// A retrieval-sized chunk of transcript text with speaker metadata.
///
/// Chunks are created fresh on every chunking call and handed to the
/// indexer; they have no lifecycle beyond that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based, contiguous chunk index within the episode.
    pub chunk_id: usize,
    /// Space-joined, trimmed text of the constituent segments.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Start formatted as HH:MM:SS.mmm.
    pub timestamp_start: String,
    /// End formatted as HH:MM:SS.mmm.
    pub timestamp_end: String,
    /// end - start, rounded to 2 decimals.
    pub duration: f64,
    /// Unique speakers in order of first appearance.
    pub speakers: Vec<String>,
    /// Episode file name, unchanged from the transcript.
    pub episode: String,
    /// Number of segments consumed by this chunk (overlap pre-seeds from
    /// the previous chunk are not counted).
    pub num_segments: usize,
}

impl Chunk {
    /// Assemble a chunk from accumulated parts, filling in derived fields.
    pub(crate) fn from_accumulated(
        chunk_id: usize,
        text: &str,
        start: f64,
        end: f64,
        speakers: Vec<String>,
        episode: &str,
        num_segments: usize,
    ) -> Self {
        Self {
            chunk_id,
            text: text.trim().to_string(),
            start,
            end,
            timestamp_start: seconds_to_timestamp(start),
            timestamp_end: seconds_to_timestamp(end),
            duration: round2(end - start),
            speakers,
            episode: episode.to_string(),
            num_segments,
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target duration per chunk in seconds (duration strategy).
    pub chunk_duration: f64,
    /// Overlap between adjacent chunks in seconds (duration strategy).
    pub chunk_overlap: f64,
    /// Minimum characters for a chunk to be emitted (duration strategy).
    pub min_chunk_chars: usize,
    /// Maximum duration of a single speaker turn (turn strategy).
    pub max_turn_duration: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_duration: 45.0,
            chunk_overlap: 5.0,
            min_chunk_chars: 50,
            max_turn_duration: 60.0,
        }
    }
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Duration-bounded chunks with overlap.
    Duration,
    /// One chunk per bounded speaker turn.
    Turns,
}

impl std::str::FromStr for ChunkStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duration" | "temporal" => Ok(ChunkStrategy::Duration),
            "turns" | "speaker-turns" => Ok(ChunkStrategy::Turns),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkStrategy::Duration => write!(f, "duration"),
            ChunkStrategy::Turns => write!(f, "turns"),
        }
    }
}

/// Trait for chunking implementations.
///
/// Chunkers are pure, synchronous transformations; they never mutate the
/// transcript and hold no state between calls.
pub trait Chunker: Send + Sync {
    /// Split a merged transcript into chunks.
    fn chunk(&self, transcript: &MergedTranscript, config: &ChunkingConfig) -> Result<Vec<Chunk>>;
}

/// Create a chunker for the given strategy.
pub fn create_chunker(strategy: ChunkStrategy) -> Box<dyn Chunker> {
    match strategy {
        ChunkStrategy::Duration => Box::new(DurationChunker::new()),
        ChunkStrategy::Turns => Box::new(TurnChunker::new()),
    }
}

/// Insertion-ordered set of speaker labels.
///
/// Hash-set iteration order is not stable across runs, which would make
/// chunk output nondeterministic; this keeps first-appearance order.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpeakerSet {
    labels: Vec<String>,
}

impl SpeakerSet {
    pub fn insert(&mut self, label: &str) {
        if !self.labels.iter().any(|l| l == label) {
            self.labels.push(label.to_string());
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.labels
    }
}

/// Round to 2 decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_set_keeps_first_appearance_order() {
        let mut set = SpeakerSet::default();
        set.insert("SPEAKER_01");
        set.insert("SPEAKER_00");
        set.insert("SPEAKER_01");
        set.insert("UNKNOWN");

        assert_eq!(set.into_vec(), vec!["SPEAKER_01", "SPEAKER_00", "UNKNOWN"]);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("duration".parse::<ChunkStrategy>().unwrap(), ChunkStrategy::Duration);
        assert_eq!("Turns".parse::<ChunkStrategy>().unwrap(), ChunkStrategy::Turns);
        assert_eq!("speaker-turns".parse::<ChunkStrategy>().unwrap(), ChunkStrategy::Turns);
        assert!("semantic".parse::<ChunkStrategy>().is_err());
    }

    #[test]
    fn test_chunk_derived_fields() {
        let chunk = Chunk::from_accumulated(
            0,
            "  some text  ",
            5.0,
            50.125,
            vec!["SPEAKER_00".to_string()],
            "ep.mp3",
            3,
        );

        assert_eq!(chunk.text, "some text");
        assert_eq!(chunk.timestamp_start, "00:00:05.000");
        assert_eq!(chunk.timestamp_end, "00:00:50.125");
        assert_eq!(chunk.duration, 45.13);
        assert_eq!(chunk.num_segments, 3);
    }
}
