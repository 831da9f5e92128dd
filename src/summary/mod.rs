//! Transcript summarization.
//!
//! * [`ExtractiveSummarizer`] — offline word-frequency sentence extraction.
//! * [`LlmSummarizer`] — abstractive summary from the chat endpoint.
//!
//! [`from_config`] picks one according to `summary.provider`.

pub mod extractive;
pub mod llm;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AppConfig, SummaryProvider};
use crate::llm::{ChatClient, LlmError};
use crate::stt::Transcript;

pub use extractive::{ExtractiveSummarizer, NO_SUMMARY};
pub use llm::LlmSummarizer;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &Transcript) -> Result<String, SummaryError>;
}

/// Build the summarizer selected by `config.summary.provider`.
pub fn from_config(config: &AppConfig) -> Arc<dyn Summarizer> {
    match config.summary.provider {
        SummaryProvider::Extractive => {
            Arc::new(ExtractiveSummarizer::new(config.summary.max_sentences))
        }
        SummaryProvider::Llm => Arc::new(LlmSummarizer::new(
            ChatClient::from_config(&config.llm),
            config.summary.max_sentences,
        )),
    }
}
