//! Duration-bounded chunking with overlap.

use super::{Chunk, Chunker, ChunkingConfig, SpeakerSet};
use crate::error::{Result, SkaldError};
use crate::fusion::{MergedSegment, MergedTranscript};
use tracing::{debug, warn};

/// How many segments before a flush boundary are considered for pre-seeding
/// the next chunk's overlap window.
const OVERLAP_LOOKBACK: usize = 5;

/// Duration-based chunker.
///
/// Accumulates segments until a chunk exceeds the target duration, then
/// flushes and restarts. The flush-boundary rule: the closed chunk's end is
/// the end of the segment that triggered the overflow, but that segment's
/// text belongs to the *next* chunk. The next chunk starts `chunk_overlap`
/// seconds before the boundary and is pre-seeded with recent segments whose
/// end falls inside that window, so a topic spanning the boundary is
/// retrievable from either neighbor.
pub struct DurationChunker;

impl DurationChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DurationChunker {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable chunk-in-progress state, passed explicitly through the fold.
struct Accumulator {
    text: String,
    start: f64,
    end: f64,
    speakers: SpeakerSet,
    /// Segments consumed by the main pass; overlap pre-seeds not counted.
    fresh_segments: usize,
}

impl Accumulator {
    /// Open an empty accumulator at the given start time.
    fn open(start: f64) -> Self {
        Self {
            text: String::new(),
            start,
            end: start,
            speakers: SpeakerSet::default(),
            fresh_segments: 0,
        }
    }

    /// Open an accumulator pre-seeded with the overlap window.
    ///
    /// Looks back at most [`OVERLAP_LOOKBACK`] segments before `idx` and
    /// copies those whose end falls at or after `overlap_start`.
    fn open_with_overlap(segments: &[MergedSegment], idx: usize, overlap_start: f64) -> Self {
        let mut acc = Self::open(overlap_start);

        let lookback_from = idx.saturating_sub(OVERLAP_LOOKBACK);
        for segment in &segments[lookback_from..idx] {
            if segment.end >= overlap_start {
                acc.append_text(&segment.text);
                acc.speakers.insert(&segment.speaker);
                acc.end = segment.end;
            }
        }

        acc
    }

    fn append_text(&mut self, text: &str) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }

    /// Consume a segment in the main pass.
    fn push(&mut self, segment: &MergedSegment) {
        self.append_text(&segment.text);
        self.end = segment.end;
        self.speakers.insert(&segment.speaker);
        self.fresh_segments += 1;
    }

    fn content_len(&self) -> usize {
        self.text.trim().len()
    }

    /// Close into a chunk ending at the given flush boundary.
    fn close(self, chunk_id: usize, end: f64, episode: &str) -> Chunk {
        Chunk::from_accumulated(
            chunk_id,
            &self.text,
            self.start,
            end,
            self.speakers.into_vec(),
            episode,
            self.fresh_segments,
        )
    }
}

impl Chunker for DurationChunker {
    fn chunk(&self, transcript: &MergedTranscript, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
        if config.chunk_overlap >= config.chunk_duration {
            return Err(SkaldError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_duration ({})",
                config.chunk_overlap, config.chunk_duration
            )));
        }

        let segments = &transcript.segments;
        let episode = &transcript.file;

        if segments.is_empty() {
            warn!("No segments found in transcript for {}", episode);
            return Ok(Vec::new());
        }

        debug!("Chunking transcript: {} ({} segments)", episode, segments.len());

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut acc: Option<Accumulator> = None;

        for (idx, segment) in segments.iter().enumerate() {
            let mut current = acc.take().unwrap_or_else(|| Accumulator::open(segment.start));

            let elapsed = segment.end - current.start;
            if elapsed > config.chunk_duration && current.content_len() >= config.min_chunk_chars {
                // Flush: the chunk ends at the boundary where the overflow
                // was detected; the triggering segment opens the next chunk.
                let chunk_id = chunks.len();
                chunks.push(current.close(chunk_id, segment.end, episode));

                let overlap_start = segment.end - config.chunk_overlap;
                current = Accumulator::open_with_overlap(segments, idx, overlap_start);
            }

            current.push(segment);
            acc = Some(current);
        }

        // Trailing content is kept only if it meets the minimum size;
        // a shorter remainder is dropped.
        if let Some(current) = acc {
            if current.content_len() >= config.min_chunk_chars {
                let chunk_id = chunks.len();
                let end = current.end;
                chunks.push(current.close(chunk_id, end, episode));
            }
        }

        debug!("Created {} chunks from {} segments", chunks.len(), segments.len());
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::MergedSegment;

    fn segment(start: f64, end: f64, text: &str, speaker: &str) -> MergedSegment {
        MergedSegment {
            start,
            end,
            text: text.to_string(),
            speaker: speaker.to_string(),
            words: None,
        }
    }

    fn transcript(segments: Vec<MergedSegment>) -> MergedTranscript {
        MergedTranscript {
            file: "ep1.mp3".to_string(),
            language: "en".to_string(),
            num_speakers: 2,
            speakers: vec!["SPEAKER_00".to_string(), "SPEAKER_01".to_string()],
            segments,
        }
    }

    fn five_segments() -> MergedTranscript {
        transcript(vec![
            segment(0.0, 4.0, "Alpha bravo charlie delta.", "SPEAKER_00"),
            segment(4.0, 8.0, "Echo foxtrot golf hotel.", "SPEAKER_00"),
            segment(8.0, 12.0, "India juliet kilo lima.", "SPEAKER_01"),
            segment(12.0, 16.0, "Mike november oscar papa.", "SPEAKER_01"),
            segment(16.0, 20.0, "Quebec romeo sierra tango.", "SPEAKER_00"),
        ])
    }

    fn config(duration: f64, overlap: f64, min_chars: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_duration: duration,
            chunk_overlap: overlap,
            min_chunk_chars: min_chars,
            ..ChunkingConfig::default()
        }
    }

    #[test]
    fn test_boundary_regression() {
        // Pins the flush-boundary rule exactly: the chunk closed at the
        // overflow boundary ends at the triggering segment's end but does
        // not contain its text.
        let chunks = DurationChunker::new()
            .chunk(&five_segments(), &config(10.0, 2.0, 5))
            .unwrap();

        assert_eq!(chunks.len(), 2);

        assert_eq!(chunks[0].chunk_id, 0);
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 12.0);
        assert_eq!(
            chunks[0].text,
            "Alpha bravo charlie delta. Echo foxtrot golf hotel."
        );
        assert_eq!(chunks[0].speakers, vec!["SPEAKER_00"]);
        assert_eq!(chunks[0].num_segments, 2);
        assert_eq!(chunks[0].timestamp_end, "00:00:12.000");

        assert_eq!(chunks[1].chunk_id, 1);
        assert_eq!(chunks[1].start, 10.0);
        assert_eq!(chunks[1].end, 20.0);
        assert_eq!(
            chunks[1].text,
            "India juliet kilo lima. Mike november oscar papa. Quebec romeo sierra tango."
        );
        // First-appearance order
        assert_eq!(chunks[1].speakers, vec!["SPEAKER_01", "SPEAKER_00"]);
        assert_eq!(chunks[1].num_segments, 3);
    }

    #[test]
    fn test_overlap_preseeds_shared_text() {
        // A wider overlap window pulls the previous segment's text into the
        // next chunk, so boundary-spanning content is in both neighbors.
        let chunks = DurationChunker::new()
            .chunk(&five_segments(), &config(10.0, 5.0, 5))
            .unwrap();

        assert_eq!(chunks.len(), 3);

        assert_eq!(chunks[1].start, 7.0);
        assert!(chunks[0].text.contains("Echo foxtrot golf hotel."));
        assert!(chunks[1].text.starts_with("Echo foxtrot golf hotel."));
        // Pre-seeded segment is not counted in num_segments
        assert_eq!(chunks[1].num_segments, 2);

        assert_eq!(chunks[2].start, 15.0);
        assert!(chunks[2].text.starts_with("Mike november oscar papa."));
        assert_eq!(chunks[2].num_segments, 1);
    }

    #[test]
    fn test_chunk_starts_non_decreasing_and_coverage() {
        let transcript = five_segments();
        let chunks = DurationChunker::new()
            .chunk(&transcript, &config(10.0, 5.0, 5))
            .unwrap();

        for pair in chunks.windows(2) {
            assert!(pair[0].start <= pair[1].start);
            // Overlap only between adjacent chunks: each chunk starts
            // before its predecessor ends
            assert!(pair[1].start <= pair[0].end);
        }

        let first = transcript.segments.first().unwrap().start;
        let last = transcript.segments.last().unwrap().end;
        assert_eq!(chunks.first().unwrap().start, first);
        assert_eq!(chunks.last().unwrap().end, last);
    }

    #[test]
    fn test_short_trailing_remainder_is_dropped() {
        let transcript = transcript(vec![
            segment(0.0, 20.0, "This opening run of text is comfortably past fifty characters long.", "SPEAKER_00"),
            segment(40.0, 44.0, "Bye.", "SPEAKER_01"),
        ]);

        // Segment 2 triggers the flush; it lands alone in the trailing
        // accumulator, under the 50-char floor, and is dropped.
        let chunks = DurationChunker::new()
            .chunk(&transcript, &config(30.0, 5.0, 50))
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 44.0);
        assert!(!chunks[0].text.contains("Bye."));
    }

    #[test]
    fn test_trailing_remainder_meeting_minimum_is_kept() {
        let transcript = transcript(vec![
            segment(0.0, 20.0, "This opening run of text is comfortably past fifty characters long.", "SPEAKER_00"),
            segment(40.0, 44.0, "And this closing remark is itself long enough to survive the floor.", "SPEAKER_01"),
        ]);

        let chunks = DurationChunker::new()
            .chunk(&transcript, &config(30.0, 5.0, 50))
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].start, 39.0);
        assert_eq!(chunks[1].end, 44.0);
        assert_eq!(chunks[1].speakers, vec!["SPEAKER_01"]);
    }

    #[test]
    fn test_empty_transcript_returns_empty() {
        let chunks = DurationChunker::new()
            .chunk(&transcript(Vec::new()), &ChunkingConfig::default())
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_single_chunk_when_under_duration() {
        let transcript = transcript(vec![
            segment(0.0, 10.0, "A single segment easily exceeding the character floor set below.", "SPEAKER_00"),
        ]);

        let chunks = DurationChunker::new()
            .chunk(&transcript, &config(45.0, 5.0, 10))
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 10.0);
        assert_eq!(chunks[0].duration, 10.0);
        assert_eq!(chunks[0].speakers, vec!["SPEAKER_00"]);
    }

    #[test]
    fn test_chunks_from_fused_transcript() {
        use crate::diarization::{DiarizationResult, SpeakerInterval};
        use crate::transcription::{TranscriptResult, TranscriptSegment};

        let transcription = TranscriptResult::new(
            "ep.mp3",
            "en",
            vec![
                TranscriptSegment::new(0.0, 5.0, "Hello world"),
                TranscriptSegment::new(5.0, 10.0, "How are you"),
                TranscriptSegment::new(10.0, 15.0, "Fine thanks"),
            ],
        );
        let diarization = DiarizationResult::from_intervals(
            "ep.mp3",
            vec![
                SpeakerInterval::new(0.0, 7.0, "SPEAKER_00"),
                SpeakerInterval::new(7.0, 15.0, "SPEAKER_01"),
            ],
        );
        let merged = crate::fusion::merge(&transcription, &diarization);

        let chunks = DurationChunker::new()
            .chunk(&merged, &config(60.0, 5.0, 10))
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world How are you Fine thanks");
        assert_eq!(chunks[0].speakers, vec!["SPEAKER_00", "SPEAKER_01"]);
        assert_eq!(chunks[0].episode, "ep.mp3");
        assert_eq!(chunks[0].num_segments, 3);
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 15.0);
    }

    #[test]
    fn test_invalid_overlap_config_rejected() {
        let err = DurationChunker::new()
            .chunk(&five_segments(), &config(5.0, 5.0, 10))
            .unwrap_err();
        assert!(matches!(err, SkaldError::InvalidInput(_)));
    }
}
