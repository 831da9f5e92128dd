//! LLM-backed text services.
//!
//! This module provides:
//! * [`ChatClient`] — OpenAI-compatible `/v1/chat/completions` client.
//! * [`Translator`] — async trait for machine translation.
//! * [`ApiTranslator`] — translation through the chat endpoint, with
//!   numbered batches for subtitle lines.
//! * [`PromptBuilder`] — translation and summary prompts.
//! * [`LlmError`] — error variants for LLM operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use videoconv::config::AppConfig;
//! use videoconv::ids::Locale;
//! use videoconv::llm::{ApiTranslator, ChatClient, Translator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let translator = ApiTranslator::new(ChatClient::from_config(&config.llm));
//!
//!     let text = translator
//!         .translate("Hola a todos", Locale::En, Some("es"))
//!         .await
//!         .unwrap();
//!     println!("{text}");
//! }
//! ```

pub mod client;
pub mod prompt;
pub mod translator;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ChatClient, LlmError};
pub use prompt::PromptBuilder;
pub use translator::{ApiTranslator, Translator};
