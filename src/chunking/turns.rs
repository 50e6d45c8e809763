//! Speaker-turn chunking.

use super::{Chunk, Chunker, ChunkingConfig, SpeakerSet};
use crate::error::Result;
use crate::fusion::{MergedSegment, MergedTranscript};
use tracing::{debug, warn};

/// Chunker that follows contiguous same-speaker runs.
///
/// A new chunk starts whenever the speaker label changes or the current run
/// exceeds the configured maximum duration, whichever comes first. Every
/// chunk therefore carries exactly one speaker. Unlike the duration
/// strategy, the trailing accumulator is always emitted: a turn has no
/// minimum length.
pub struct TurnChunker;

impl TurnChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TurnChunker {
    fn default() -> Self {
        Self::new()
    }
}

/// One speaker turn in progress.
struct TurnAccumulator {
    text: String,
    start: f64,
    end: f64,
    speaker: String,
    num_segments: usize,
}

impl TurnAccumulator {
    fn open(segment: &MergedSegment) -> Self {
        Self {
            text: segment.text.clone(),
            start: segment.start,
            end: segment.end,
            speaker: segment.speaker.clone(),
            num_segments: 1,
        }
    }

    fn push(&mut self, segment: &MergedSegment) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(&segment.text);
        self.end = segment.end;
        self.num_segments += 1;
    }

    fn close(self, chunk_id: usize, episode: &str) -> Chunk {
        let mut speakers = SpeakerSet::default();
        speakers.insert(&self.speaker);

        Chunk::from_accumulated(
            chunk_id,
            &self.text,
            self.start,
            self.end,
            speakers.into_vec(),
            episode,
            self.num_segments,
        )
    }
}

impl Chunker for TurnChunker {
    fn chunk(&self, transcript: &MergedTranscript, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
        let segments = &transcript.segments;
        let episode = &transcript.file;

        if segments.is_empty() {
            warn!("No segments found in transcript for {}", episode);
            return Ok(Vec::new());
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut acc: Option<TurnAccumulator> = None;

        for segment in segments {
            let turn_break = acc.as_ref().is_some_and(|a| {
                a.speaker != segment.speaker
                    || segment.end - a.start > config.max_turn_duration
            });

            if turn_break {
                if let Some(finished) = acc.take() {
                    let chunk_id = chunks.len();
                    chunks.push(finished.close(chunk_id, episode));
                }
            }

            match acc.as_mut() {
                Some(current) => current.push(segment),
                None => acc = Some(TurnAccumulator::open(segment)),
            }
        }

        // Trailing turn is always emitted, no minimum gate
        if let Some(finished) = acc {
            if !finished.text.trim().is_empty() {
                let chunk_id = chunks.len();
                chunks.push(finished.close(chunk_id, episode));
            }
        }

        debug!("Created {} speaker-turn chunks", chunks.len());
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

    #[test]
    fn test_chunks_follow_speaker_changes() {
        let transcript = transcript(vec![
            segment(0.0, 5.0, "Hi there.", "SPEAKER_00"),
            segment(5.0, 10.0, "How have you been?", "SPEAKER_00"),
            segment(10.0, 14.0, "Pretty well, thanks.", "SPEAKER_01"),
            segment(14.0, 18.0, "Good to hear.", "SPEAKER_00"),
        ]);

        let chunks = TurnChunker::new()
            .chunk(&transcript, &ChunkingConfig::default())
            .unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "Hi there. How have you been?");
        assert_eq!(chunks[0].speakers, vec!["SPEAKER_00"]);
        assert_eq!(chunks[0].num_segments, 2);
        assert_eq!(chunks[1].speakers, vec!["SPEAKER_01"]);
        assert_eq!(chunks[2].text, "Good to hear.");
        assert_eq!(chunks[2].start, 14.0);
        assert_eq!(chunks[2].end, 18.0);
    }

    #[test]
    fn test_every_chunk_has_exactly_one_speaker() {
        let transcript = transcript(vec![
            segment(0.0, 3.0, "a", "SPEAKER_00"),
            segment(3.0, 6.0, "b", "SPEAKER_01"),
            segment(6.0, 9.0, "c", "SPEAKER_01"),
            segment(9.0, 12.0, "d", "UNKNOWN"),
            segment(12.0, 15.0, "e", "SPEAKER_00"),
        ]);

        let chunks = TurnChunker::new()
            .chunk(&transcript, &ChunkingConfig::default())
            .unwrap();

        for chunk in &chunks {
            assert_eq!(chunk.speakers.len(), 1);
        }
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn test_long_turn_is_split_by_max_duration() {
        let transcript = transcript(vec![
            segment(0.0, 40.0, "First part of a monologue.", "SPEAKER_00"),
            segment(40.0, 70.0, "Still going.", "SPEAKER_00"),
            segment(70.0, 90.0, "And going.", "SPEAKER_00"),
        ]);

        let config = ChunkingConfig {
            max_turn_duration: 60.0,
            ..ChunkingConfig::default()
        };

        let chunks = TurnChunker::new().chunk(&transcript, &config).unwrap();

        // Segment 2 would stretch the turn to 70s, so it opens a new chunk
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 40.0);
        assert_eq!(chunks[1].start, 40.0);
        assert_eq!(chunks[1].end, 90.0);
        assert_eq!(chunks[1].speakers, vec!["SPEAKER_00"]);
    }

    #[test]
    fn test_trailing_turn_always_emitted() {
        // No minimum-length gate, unlike the duration strategy
        let transcript = transcript(vec![
            segment(0.0, 5.0, "A long enough opening turn from the host.", "SPEAKER_00"),
            segment(5.0, 6.0, "Bye.", "SPEAKER_01"),
        ]);

        let chunks = TurnChunker::new()
            .chunk(&transcript, &ChunkingConfig::default())
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "Bye.");
    }

    #[test]
    fn test_chunk_ids_contiguous_and_time_ordered() {
        let transcript = transcript(vec![
            segment(0.0, 3.0, "a", "SPEAKER_00"),
            segment(3.0, 6.0, "b", "SPEAKER_01"),
            segment(6.0, 9.0, "c", "SPEAKER_00"),
        ]);

        let chunks = TurnChunker::new()
            .chunk(&transcript, &ChunkingConfig::default())
            .unwrap();

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_id, i);
        }
        for pair in chunks.windows(2) {
            assert!(pair[0].start <= pair[1].start);
        }
    }

    #[test]
    fn test_empty_transcript_returns_empty() {
        let chunks = TurnChunker::new()
            .chunk(&transcript(Vec::new()), &ChunkingConfig::default())
            .unwrap();
        assert!(chunks.is_empty());
    }
}
