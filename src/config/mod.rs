//! Configuration module for Skald.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, SummaryPrompts};
pub use settings::{
    AudioSettings, ChunkingSettings, DiarizationSettings, EmbeddingSettings, GeneralSettings,
    PromptSettings, RagSettings, Settings, TranscriptionSettings, VectorStoreSettings,
};
