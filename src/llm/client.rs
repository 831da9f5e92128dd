//! `ChatClient` — minimal OpenAI-compatible `/v1/chat/completions` client.
//!
//! Shared by the translator and the LLM summarizer.  Works with Ollama
//! (OpenAI mode), OpenAI, Groq, LM Studio, vLLM … All connection details
//! come from [`LlmConfig`]; nothing is hardcoded.

use thiserror::Error;

use crate::config::LlmConfig;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the chat endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error, or a non-success status.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The LLM returned a response with no usable text content.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ChatClient {
    /// Build a client with the per-request timeout from `config.timeout_secs`.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send one system + user exchange and return the trimmed reply.
    ///
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user",   "content": user   }
            ],
            "stream":      false,
            "temperature": self.config.temperature
        });

        let mut req = self.client.post(&url).json(&body);
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Request(format!("HTTP {status}: {}", text.trim())));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        extract_content(&json)
    }
}

/// `choices[0].message.content`, trimmed and non-empty.
pub(crate) fn extract_content(json: &serde_json::Value) -> Result<String, LlmError> {
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(LlmError::EmptyResponse)?
        .trim()
        .to_string();

    if content.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_choice() {
        let reply = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Hola  " } }]
        });
        assert_eq!(extract_content(&reply).unwrap(), "Hola");
    }

    #[test]
    fn blank_or_missing_content_is_empty_response() {
        let blank = json!({ "choices": [{ "message": { "content": "  " } }] });
        assert!(matches!(extract_content(&blank), Err(LlmError::EmptyResponse)));
        assert!(matches!(
            extract_content(&json!({ "error": "overloaded" })),
            Err(LlmError::EmptyResponse)
        ));
    }

    #[test]
    fn from_config_accepts_empty_api_key() {
        let config = LlmConfig {
            api_key: Some(String::new()),
            ..LlmConfig::default()
        };
        let client = ChatClient::from_config(&config);
        assert_eq!(client.config().model, "qwen2.5:3b");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 5,
            ..LlmConfig::default()
        };
        let err = ChatClient::from_config(&config)
            .complete("system", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Request(_) | LlmError::Timeout));
    }
}
