//! `ApiTranscriber` — OpenAI-compatible `/v1/audio/transcriptions` client.
//!
//! Works with faster-whisper-server, the whisper.cpp server, OpenAI and any
//! other provider that accepts a multipart upload and answers with
//! `verbose_json` segments.  All connection details come from [`SttConfig`].

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::SttConfig;

use super::engine::{SttError, Transcriber};
use super::transcribe::{Segment, Transcript};

/// Shape of a `response_format=verbose_json` reply.  Unknown fields
/// (`id`, `tokens`, `avg_logprob` …) are ignored.
#[derive(Debug, Deserialize)]
struct VerboseJson {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<Segment>,
}

pub struct ApiTranscriber {
    client: reqwest::Client,
    config: SttConfig,
}

impl ApiTranscriber {
    pub fn from_config(config: &SttConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// The per-job hint wins over the configured default; `"auto"` means
    /// detection.
    fn language<'a>(&'a self, hint: Option<&'a str>) -> Option<&'a str> {
        hint.or(Some(self.config.language.as_str()))
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("auto"))
    }
}

#[async_trait]
impl Transcriber for ApiTranscriber {
    async fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<Transcript, SttError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| SttError::audio(audio, e))?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".into());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| SttError::Request(e.to_string()))?;
        let mut form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json");
        if let Some(lang) = self.language(language) {
            form = form.text("language", lang.to_string());
        }

        let url = format!(
            "{}/v1/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        );
        log::debug!("stt: POST {url}");

        let mut req = self.client.post(&url).multipart(form);
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SttError::Request(format!("HTTP {status}: {}", body.trim())));
        }

        let transcript = parse_verbose_json(&body)?;
        Ok(match (transcript.language.is_some(), self.language(language)) {
            (false, Some(hint)) => Transcript {
                language: Some(hint.to_ascii_lowercase()),
                ..transcript
            },
            _ => transcript,
        })
    }
}

/// Decode a `verbose_json` body.  A reply with text but no segments becomes
/// a single untimed segment.
pub(crate) fn parse_verbose_json(body: &str) -> Result<Transcript, SttError> {
    let reply: VerboseJson =
        serde_json::from_str(body).map_err(|e| SttError::Parse(e.to_string()))?;

    let segments = if reply.segments.is_empty() && !reply.text.trim().is_empty() {
        vec![Segment::new(0.0, 0.0, reply.text)]
    } else {
        reply.segments
    };
    Ok(Transcript::new(reply.language, segments))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
