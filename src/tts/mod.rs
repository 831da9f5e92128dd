//! Speech synthesis for translated summaries.
//!
//! # Architecture
//!
//! ```text
//! SpeechSynthesizer (trait)
//!   ├─ GttsSynthesizer    — translate_tts HTTP endpoint, ≤100-char chunks → MP3
//!   ├─ EspeakSynthesizer  — espeak-ng → WAV → ffmpeg → MP3
//!   └─ FallbackSynthesizer<P, S> — P, and S when P fails
//! ```
//!
//! [`from_config`] assembles the chain selected by the `[tts]` section.

pub mod espeak;
pub mod fallback;
pub mod gtts;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AppConfig, TtsProvider};
use crate::ids::Locale;
use crate::media::ToolError;

pub use espeak::EspeakSynthesizer;
pub use fallback::FallbackSynthesizer;
pub use gtts::GttsSynthesizer;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("nothing to synthesize: text is empty")]
    EmptyText,

    #[error("TTS request failed: {0}")]
    Request(String),

    #[error("TTS request timed out")]
    Timeout,

    #[error("TTS endpoint returned no audio")]
    EmptyAudio,

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("TTS I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}

impl TtsError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Writes spoken `text` in `locale` as an MP3 file at `output`.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, locale: Locale, output: &Path) -> Result<(), TtsError>;
}

/// Build the synthesizer chain selected by `config.tts`.
pub fn from_config(config: &AppConfig) -> Arc<dyn SpeechSynthesizer> {
    let espeak = || EspeakSynthesizer::new(&config.tts, &config.extraction.ffmpeg_path);
    match config.tts.provider {
        TtsProvider::Gtts if config.tts.fallback => Arc::new(FallbackSynthesizer::new(
            GttsSynthesizer::from_config(&config.tts),
            espeak(),
        )),
        TtsProvider::Gtts => Arc::new(GttsSynthesizer::from_config(&config.tts)),
        TtsProvider::Espeak => Arc::new(espeak()),
    }
}
