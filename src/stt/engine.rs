//! Core transcription trait and error type.
//!
//! [`Transcriber`] is the interface used by the Transcription stage.  It is
//! object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn Transcriber>`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use super::transcribe::Transcript;

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// All errors that can arise from the STT subsystem.
#[derive(Debug, Error)]
pub enum SttError {
    /// The extracted audio could not be read.
    #[error("cannot read audio {path}: {source}")]
    Audio {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The audio file is not 16-bit PCM WAV.
    #[error("unsupported audio format: {0}")]
    Format(String),

    /// HTTP transport error or non-success status.
    #[error("transcription request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("transcription request timed out")]
    Timeout,

    /// The response could not be parsed.
    #[error("failed to parse transcription response: {0}")]
    Parse(String),

    /// The GGML model file was not found at the given path.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// whisper-rs failed to initialise a context or state.
    #[error("whisper context initialisation failed: {0}")]
    ContextInit(String),

    /// An error occurred during local inference.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// The configured backend is not compiled into this build.
    #[error("{0}")]
    Unsupported(String),
}

impl From<reqwest::Error> for SttError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SttError::Timeout
        } else {
            SttError::Request(e.to_string())
        }
    }
}

impl SttError {
    pub(crate) fn audio(path: &Path, source: std::io::Error) -> Self {
        Self::Audio {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Transcriber trait
// ---------------------------------------------------------------------------

/// Async interface for speech-to-text backends.
///
/// # Contract
///
/// - `audio` is a 16-bit PCM WAV file as written by the AudioExtraction stage.
/// - `language` is an ISO-639-1 hint; `None` asks the backend to detect it.
/// - The returned transcript has trimmed text and no empty segments.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path, language: Option<&str>)
        -> Result<Transcript, SttError>;
}

// Compile-time assertion: Box<dyn Transcriber> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Transcriber>) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stt_error_display_includes_path() {
        let e = SttError::audio(
            Path::new("/data/audio.wav"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(e.to_string().contains("/data/audio.wav"));
    }

    #[test]
    fn unsupported_is_shown_verbatim() {
        let e = SttError::Unsupported("rebuild with --features whisper".into());
        assert_eq!(e.to_string(), "rebuild with --features whisper");
    }
}
