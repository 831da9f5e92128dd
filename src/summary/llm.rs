//! Abstractive summaries through the chat-completions endpoint.

use async_trait::async_trait;

use crate::llm::{ChatClient, PromptBuilder};
use crate::stt::Transcript;

use super::{SummaryError, Summarizer, NO_SUMMARY};

pub struct LlmSummarizer {
    chat: ChatClient,
    prompts: PromptBuilder,
    max_sentences: usize,
}

impl LlmSummarizer {
    pub fn new(chat: ChatClient, max_sentences: usize) -> Self {
        Self {
            chat,
            prompts: PromptBuilder::new(),
            max_sentences: max_sentences.max(1),
        }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, transcript: &Transcript) -> Result<String, SummaryError> {
        let text = transcript.full_text();
        if text.trim().is_empty() {
            return Ok(NO_SUMMARY.to_string());
        }
        let (system, user) =
            self.prompts
                .summarize(&text, transcript.language.as_deref(), self.max_sentences);
        Ok(self.chat.complete(&system, &user).await?)
    }
}
