//! Chat orchestration: context retrieval, prompt assembly, and cleanup of
//! the model's reply.

use crate::context::ContextBuilder;
use crate::ollama::{GenerateOptions, GenerationError, OllamaClient};
use tracing::info;

const FALLBACK_REPLY: &str =
    "I apologize, but I couldn't generate a proper response based on the papers.";

/// A post-processed model reply. `fallback` is set when the model produced
/// nothing usable and the fixed apology was substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub fallback: bool,
}

#[derive(Clone)]
pub struct ChatOrchestrator {
    context: ContextBuilder,
    ollama: OllamaClient,
    options: GenerateOptions,
}

impl ChatOrchestrator {
    pub fn new(context: ContextBuilder, ollama: OllamaClient) -> Self {
        Self {
            context,
            ollama,
            options: GenerateOptions::default(),
        }
    }

    /// Answers `message` grounded in the papers cached for `topic`.
    pub async fn answer(&self, topic: &str, message: &str) -> Result<ChatReply, GenerationError> {
        let context = self.context.get_or_build(topic).await;
        let prompt = build_prompt(&context, message);
        info!(prompt_len = prompt.len(), "submitting prompt to model");
        let raw = self.ollama.generate(&prompt, &self.options).await?;
        Ok(postprocess(&raw))
    }
}

fn build_prompt(context: &str, message: &str) -> String {
    format!(
        "You are a research assistant. Based on the following papers:\n\n\
{context}\n\n\
User question: {message}\n\n\
Please provide a detailed and specific response focusing on the content of \
these papers. If summarizing advancements, list them point by point with \
specific details from the papers."
    )
}

fn postprocess(raw: &str) -> ChatReply {
    let text = raw.trim();
    if text.is_empty() {
        return ChatReply {
            text: FALLBACK_REPLY.to_string(),
            fallback: true,
        };
    }
    // Enumerated lists render better with a leading break.
    let text = if text.starts_with("1.") {
        format!("\n{text}")
    } else {
        text.to_string()
    };
    ChatReply {
        text,
        fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reply_becomes_fallback() {
        let reply = postprocess("   \n ");
        assert!(reply.fallback);
        assert_eq!(reply.text, FALLBACK_REPLY);
    }

    #[test]
    fn reply_is_trimmed() {
        let reply = postprocess("  a grounded answer \n");
        assert!(!reply.fallback);
        assert_eq!(reply.text, "a grounded answer");
    }

    #[test]
    fn enumerated_list_gets_leading_break() {
        let reply = postprocess("1. First advancement\n2. Second");
        assert_eq!(reply.text, "\n1. First advancement\n2. Second");
    }

    #[test]
    fn prompt_embeds_context_and_question() {
        let prompt = build_prompt("Available research papers:\n\n", "what changed?");
        assert!(prompt.starts_with("You are a research assistant."));
        assert!(prompt.contains("Available research papers:\n\n"));
        assert!(prompt.contains("User question: what changed?"));
    }
}
