//! Episode summarization.

use crate::config::Prompts;
use crate::error::{Result, SkaldError};
use crate::fusion::MergedTranscript;
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Long transcripts are sampled down to at most this many segments before
/// being sent to the model.
const MAX_SUMMARY_SEGMENTS: usize = 150;

/// Generates markdown episode summaries from merged transcripts.
pub struct Summarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    prompts: Prompts,
}

impl Summarizer {
    /// Create a new summarizer.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Generate a markdown summary of an episode.
    #[instrument(skip(self, transcript), fields(episode = %transcript.file))]
    pub async fn summarize(&self, transcript: &MergedTranscript) -> Result<String> {
        info!("Generating summary for: {}", transcript.file);

        let transcript_text = sample_transcript_text(transcript, MAX_SUMMARY_SEGMENTS);

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript_text);
        vars.insert("episode".to_string(), transcript.file.clone());
        vars.insert(
            "num_segments".to_string(),
            transcript.segments.len().to_string(),
        );
        vars.insert("speakers".to_string(), transcript.speakers.join(", "));

        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.summary.system.clone())
                .build()
                .map_err(|e| SkaldError::Rag(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| SkaldError::Rag(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| SkaldError::Rag(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SkaldError::OpenAI(format!("Summary generation failed: {}", e)))?;

        let summary = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| SkaldError::Rag("Empty summary response".to_string()))?
            .clone();

        info!("Summary generated ({} chars)", summary.len());
        Ok(summary)
    }
}

/// Format the transcript as speaker-attributed lines, sampling every Nth
/// segment when the episode exceeds the limit.
fn sample_transcript_text(transcript: &MergedTranscript, max_segments: usize) -> String {
    let segments = &transcript.segments;

    let sampled: Vec<_> = if segments.len() > max_segments {
        let step = segments.len() / max_segments;
        info!(
            "Sampling {} segments from {} total",
            segments.len() / step.max(1),
            segments.len()
        );
        segments.iter().step_by(step.max(1)).collect()
    } else {
        segments.iter().collect()
    };

    sampled
        .iter()
        .map(|seg| format!("[{}]: {}", seg.speaker, seg.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::MergedSegment;

    fn transcript(count: usize) -> MergedTranscript {
        MergedTranscript {
            file: "ep1".to_string(),
            language: "en".to_string(),
            num_speakers: 1,
            speakers: vec!["SPEAKER_00".to_string()],
            segments: (0..count)
                .map(|i| MergedSegment {
                    start: i as f64,
                    end: i as f64 + 1.0,
                    text: format!("segment {}", i),
                    speaker: "SPEAKER_00".to_string(),
                    words: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_short_transcript_not_sampled() {
        let text = sample_transcript_text(&transcript(3), 150);
        assert_eq!(text.matches("[SPEAKER_00]:").count(), 3);
        assert!(text.contains("[SPEAKER_00]: segment 0"));
    }

    #[test]
    fn test_long_transcript_sampled() {
        let text = sample_transcript_text(&transcript(450), 150);
        let lines = text.matches("[SPEAKER_00]:").count();
        assert!(lines <= 150);
        assert!(lines >= 100);
    }
}
