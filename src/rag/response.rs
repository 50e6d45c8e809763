//! RAG answer generation.

use super::{context::format_context_for_prompt, ContextBuilder, ContextChunk};
use crate::config::Prompts;
use crate::error::{Result, SkaldError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// RAG engine for question answering.
pub struct RagEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    context_builder: ContextBuilder,
    prompts: Prompts,
}

impl RagEngine {
    /// Create a new RAG engine around a context builder.
    pub fn new(context_builder: ContextBuilder, model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            context_builder,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Ask a single question and get an answer with sources.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let context_chunks = self.context_builder.build(question).await?;

        if context_chunks.is_empty() {
            return Ok(RagResponse {
                answer: "I couldn't find relevant information in the podcast transcripts. \
                         Try ingesting more episodes first."
                    .to_string(),
                sources: Vec::new(),
            });
        }

        let context_text = format_context_for_prompt(&context_chunks);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context_text);

        let user_prompt = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.rag.system.clone())
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
            .map_err(|e| SkaldError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| SkaldError::Rag("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated response with {} sources", context_chunks.len());

        Ok(RagResponse {
            answer,
            sources: context_chunks,
        })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer.
    pub sources: Vec<ContextChunk>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n{} @ {} - {} (score: {:.2})",
                    source.episode, source.timestamp_start, source.timestamp_end, source.score
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_display_includes_sources() {
        let response = RagResponse {
            answer: "The hosts discuss ferrite cores.".to_string(),
            sources: vec![ContextChunk {
                episode: "ep2".to_string(),
                timestamp: "01:10".to_string(),
                timestamp_start: "00:01:10.000".to_string(),
                timestamp_end: "00:01:55.000".to_string(),
                start_seconds: 70.0,
                speakers: vec!["SPEAKER_00".to_string()],
                content: "ferrite cores".to_string(),
                score: 0.91,
            }],
        };

        let display = response.format_for_display();
        assert!(display.contains("ferrite cores"));
        assert!(display.contains("--- Sources ---"));
        assert!(display.contains("ep2 @ 00:01:10.000"));
    }

    #[test]
    fn test_response_display_without_sources() {
        let response = RagResponse {
            answer: "No idea.".to_string(),
            sources: Vec::new(),
        };
        assert_eq!(response.format_for_display(), "No idea.");
    }
}
