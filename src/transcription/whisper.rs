//! OpenAI Whisper transcription implementation.

use super::{TranscriptResult, TranscriptSegment, TranscriptionEngine, WordSpan};
use crate::audio::split_audio;
use crate::error::{Result, SkaldError};
use crate::openai::create_client;
use async_openai::types::{
    AudioResponseFormat, CreateTranscriptionRequestArgs, TimestampGranularity,
};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// OpenAI Whisper-based transcription engine.
///
/// Requests segment and word timestamp granularities so that fusion can
/// resolve speakers per word. Long audio is split into parts and processed
/// with bounded concurrency.
pub struct WhisperEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl WhisperEngine {
    /// Create a new engine with default settings.
    pub fn new() -> Self {
        Self::with_config("whisper-1", 600, 3)
    }

    /// Create a new engine with custom configuration.
    pub fn with_config(
        model: &str,
        chunk_duration_seconds: u32,
        max_concurrent_chunks: usize,
    ) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            chunk_duration_seconds,
            max_concurrent_chunks,
        }
    }

    /// Transcribe a single audio part (no splitting).
    ///
    /// Returns the detected language and the segments with attached words.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<(String, Vec<TranscriptSegment>)> {
        debug!("Transcribing audio part");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .timestamp_granularities(vec![
                TimestampGranularity::Segment,
                TimestampGranularity::Word,
            ]);

        if let Some(lang) = language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| SkaldError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| SkaldError::OpenAI(format!("Whisper API error: {}", e)))?;

        let detected_language = response.language.clone();

        let segments: Vec<TranscriptSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim()))
                    .collect()
            })
            .unwrap_or_else(|| {
                // Fallback: single segment covering the full response
                vec![TranscriptSegment::new(
                    0.0,
                    response.duration as f64,
                    response.text.trim(),
                )]
            });

        let words: Vec<WordSpan> = response
            .words
            .map(|ws| {
                ws.iter()
                    .map(|w| WordSpan {
                        word: w.word.clone(),
                        start: Some(w.start as f64),
                        end: Some(w.end as f64),
                    })
                    .collect()
            })
            .unwrap_or_else(|| {
                warn!("No word-level timestamps returned, segment-level only");
                Vec::new()
            });

        let segments = attach_words(segments, words);

        debug!("Transcribed {} segments", segments.len());
        Ok((detected_language, segments))
    }
}

impl Default for WhisperEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptionEngine for WhisperEngine {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<TranscriptResult> {
        let file = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let temp_dir = tempfile::tempdir()?;
        let parts = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;

        if parts.len() == 1 {
            let (detected, segments) = self.transcribe_single(audio_path, language).await?;
            return Ok(TranscriptResult::new(file, detected, segments));
        }

        let part_count = parts.len();
        info!("Processing {} audio parts with {}", part_count, self.model);

        let pb = ProgressBar::new(part_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Transcribing [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        // Process parts in parallel with a concurrency limit, fail fast
        let mut results: Vec<(usize, f64, String, Vec<TranscriptSegment>)> =
            Vec::with_capacity(part_count);

        let mut stream = stream::iter(parts.into_iter().enumerate())
            .map(|(idx, (part_path, time_offset))| {
                let language = language.map(|s| s.to_string());
                async move {
                    let result = self.transcribe_single(&part_path, language.as_deref()).await;
                    (idx, time_offset, result)
                }
            })
            .buffer_unordered(self.max_concurrent_chunks);

        while let Some((idx, time_offset, result)) = stream.next().await {
            pb.inc(1);
            match result {
                Ok((detected, segments)) => results.push((idx, time_offset, detected, segments)),
                Err(e) => {
                    pb.finish_and_clear();
                    drop(temp_dir);
                    let err_msg = format!("Part {} at {:.0}s failed: {}", idx, time_offset, e);
                    return Err(SkaldError::Transcription(err_msg));
                }
            }
        }

        pb.finish_and_clear();
        results.sort_by_key(|(idx, _, _, _)| *idx);

        let detected_language = results
            .first()
            .map(|(_, _, lang, _)| lang.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let mut all_segments = Vec::new();
        for (_, time_offset, _, mut segments) in results {
            for segment in &mut segments {
                segment.start += time_offset;
                segment.end += time_offset;
                if let Some(words) = &mut segment.words {
                    for word in words {
                        word.start = word.start.map(|s| s + time_offset);
                        word.end = word.end.map(|e| e + time_offset);
                    }
                }
            }
            all_segments.extend(segments);
        }

        drop(temp_dir);

        info!("Transcription complete: {} segments", all_segments.len());
        Ok(TranscriptResult::new(file, detected_language, all_segments))
    }
}

/// Attach a flat word list to the segments that contain them.
///
/// Whisper returns segments and words as two parallel lists. Words are
/// assigned sequentially: a word belongs to the current segment while its
/// midpoint falls before the segment's end; anything left over lands in the
/// final segment.
fn attach_words(mut segments: Vec<TranscriptSegment>, words: Vec<WordSpan>) -> Vec<TranscriptSegment> {
    if words.is_empty() || segments.is_empty() {
        return segments;
    }

    let mut word_iter = words.into_iter().peekable();
    let last_idx = segments.len() - 1;

    for (idx, segment) in segments.iter_mut().enumerate() {
        let mut assigned = Vec::new();

        while let Some(word) = word_iter.peek() {
            let midpoint = match (word.start, word.end) {
                (Some(s), Some(e)) => (s + e) / 2.0,
                (Some(s), None) => s,
                _ => segment.start,
            };

            if midpoint > segment.end && idx != last_idx {
                break;
            }
            if let Some(word) = word_iter.next() {
                assigned.push(word);
            }
        }

        if !assigned.is_empty() {
            segment.words = Some(assigned);
        }
    }

    segments
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start: f64, end: f64) -> WordSpan {
        WordSpan {
            word: text.to_string(),
            start: Some(start),
            end: Some(end),
        }
    }

    #[test]
    fn test_attach_words_by_midpoint() {
        let segments = vec![
            TranscriptSegment::new(0.0, 2.0, "hello world"),
            TranscriptSegment::new(2.0, 4.0, "goodbye"),
        ];
        let words = vec![
            word("hello", 0.0, 0.8),
            word("world", 0.9, 1.9),
            word("goodbye", 2.1, 3.5),
        ];

        let attached = attach_words(segments, words);

        let first = attached[0].words.as_ref().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].word, "hello");

        let second = attached[1].words.as_ref().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].word, "goodbye");
    }

    #[test]
    fn test_attach_words_leftovers_go_to_last_segment() {
        let segments = vec![TranscriptSegment::new(0.0, 1.0, "hi")];
        let words = vec![word("hi", 0.0, 0.5), word("there", 1.5, 2.0)];

        let attached = attach_words(segments, words);
        assert_eq!(attached[0].words.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_attach_words_empty() {
        let segments = vec![TranscriptSegment::new(0.0, 1.0, "hi")];
        let attached = attach_words(segments, Vec::new());
        assert!(attached[0].words.is_none());
    }

    #[test]
    fn test_api_key_check() {
        let _ = is_api_key_configured();
    }
}
