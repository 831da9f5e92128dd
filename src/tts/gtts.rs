//! Google Translate TTS endpoint, the service behind gTTS.
//!
//! The endpoint accepts at most 100 characters per request, so text is
//! split on word boundaries and the MP3 responses are concatenated (MP3
//! frames are self-delimiting, so the result plays as one file).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::TtsConfig;
use crate::ids::Locale;

use super::{SpeechSynthesizer, TtsError};

/// Characters per request accepted by the endpoint.
pub const MAX_CHUNK_CHARS: usize = 100;

pub struct GttsSynthesizer {
    client: reqwest::Client,
    base_url: String,
}

impl GttsSynthesizer {
    pub fn from_config(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.gtts_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        locale: Locale,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, TtsError> {
        let url = format!("{}/translate_tts", self.base_url);
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", locale.code()),
                ("client", "tw-ob"),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TtsError::Request(format!("HTTP {status}")));
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(TtsError::EmptyAudio);
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GttsSynthesizer {
    async fn synthesize(&self, text: &str, locale: Locale, output: &Path) -> Result<(), TtsError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, locale, idx, chunks.len()).await?);
        }
        log::debug!(
            "tts: gtts produced {} bytes in {} chunk(s) for {locale}",
            audio.len(),
            chunks.len()
        );

        tokio::fs::write(output, &audio)
            .await
            .map_err(|e| TtsError::io(output, e))
    }
}

/// Split `text` into chunks of at most `max` characters, breaking between
/// words.  A single word longer than `max` is split inside the word.
pub fn split_text(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max);
            chunks.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.len()
        } else {
            current_len + 1 + word.len()
        };
        if needed > max {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
