//! Prompt templates for Skald.
//!
//! Prompts can be customized by placing TOML files in the custom prompts
//! directory; `{{variable}}` placeholders are substituted at render time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub summary: SummaryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for RAG answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant that answers questions about podcast transcripts drawn from MULTIPLE episodes.

Guidelines:
- Answer using only the provided transcript context
- Always say which episode you are referencing
- Include timestamps in the format [HH:MM:SS]
- When information comes from different episodes, make that clear
- Mention speaker labels when they help attribute a statement
- Synthesize across episodes when relevant
- If the context doesn't contain relevant information, say so clearly

Format: "In [Episode Name], the speakers discuss X [00:03:45]. In [Other Episode], they mention Y [00:12:30].""#.to_string(),

            user: r#"Based on these podcast transcript segments, answer the question.

CONTEXT:
{{context}}

QUESTION: {{question}}

Provide an answer that cites specific episodes and timestamps, and makes clear when information comes from different episodes."#.to_string(),
        }
    }
}

/// Prompts for episode summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert podcast summarizer. Create a comprehensive, engaging summary of the podcast episode.

Your summary should include:
1. **Title**: Create a catchy episode title
2. **Overview**: 2-3 sentence overview of the main topic
3. **Key Points**: Bullet points of main discussion points
4. **Notable Quotes**: 2-3 interesting quotes with speaker attribution
5. **Takeaways**: Key insights or action items

Format in markdown with proper headers and structure."#.to_string(),

            user: r#"Please summarize this podcast episode transcript:

{{transcript}}

Episode file: {{episode}}
Total segments: {{num_segments}}
Speakers: {{speakers}}

Create a comprehensive summary following the format specified."#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from defaults, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a template with provided variables layered over config variables.
    /// Provided variables take precedence.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.rag.system.is_empty());
        assert!(!prompts.summary.system.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }
}
