//! `Translator` trait and the chat-completions implementation.

use async_trait::async_trait;

use crate::ids::Locale;

use super::client::{ChatClient, LlmError};
use super::prompt::{parse_numbered_lines, PromptBuilder};

/// Lines sent per batched request.
const BATCH_LINES: usize = 40;

/// Async interface for machine translation.
///
/// `source` is the spoken language when known (an ISO code or a language
/// name as reported by the transcriber).
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target: Locale,
        source: Option<&str>,
    ) -> Result<String, LlmError>;

    /// Translate many texts, preserving order and count.  The default
    /// implementation translates one text at a time.
    async fn translate_batch(
        &self,
        texts: &[String],
        target: Locale,
        source: Option<&str>,
    ) -> Result<Vec<String>, LlmError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.translate(text, target, source).await?);
        }
        Ok(out)
    }
}

/// Translates through an OpenAI-compatible chat endpoint.
pub struct ApiTranslator {
    chat: ChatClient,
    prompts: PromptBuilder,
}

impl ApiTranslator {
    pub fn new(chat: ChatClient) -> Self {
        Self {
            chat,
            prompts: PromptBuilder::new(),
        }
    }
}

#[async_trait]
impl Translator for ApiTranslator {
    async fn translate(
        &self,
        text: &str,
        target: Locale,
        source: Option<&str>,
    ) -> Result<String, LlmError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let (system, user) = self.prompts.translate(text, target, source);
        self.chat.complete(&system, &user).await
    }

    /// Sends numbered batches of [`BATCH_LINES`]; a batch whose reply does
    /// not line up is retried one line at a time.
    async fn translate_batch(
        &self,
        texts: &[String],
        target: Locale,
        source: Option<&str>,
    ) -> Result<Vec<String>, LlmError> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_LINES) {
            let (system, user) = self.prompts.translate_lines(chunk, target, source);
            let reply = self.chat.complete(&system, &user).await?;

            match parse_numbered_lines(&reply, chunk.len()) {
                Some(lines) => out.extend(lines),
                None => {
                    log::warn!(
                        "translate: batch reply for {target} did not match {} lines, retrying per line",
                        chunk.len()
                    );
                    for text in chunk {
                        out.push(self.translate(text, target, source).await?);
                    }
                }
            }
        }
        Ok(out)
    }
}
