//! STT (Speech-to-Text) module.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                Transcriber (trait)                    │
//! │                                                      │
//! │   ┌────────────────┐     ┌────────────────────┐      │
//! │   │ ApiTranscriber │     │ WhisperTranscriber │      │
//! │   │ multipart POST │     │ (feature whisper)  │      │
//! │   └───────┬────────┘     └─────────┬──────────┘      │
//! │           └───────────┬────────────┘                 │
//! │                       ▼                              │
//! │           Transcript { language, segments }          │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! [`from_config`] picks the backend named by `stt.provider`.

pub mod api;
pub mod engine;
pub mod transcribe;
#[cfg(feature = "whisper")]
pub mod whisper;

use std::sync::Arc;

use crate::config::{AppConfig, SttProvider};

// ── Public re-exports ──────────────────────────────────────────────────────

pub use api::ApiTranscriber;
pub use engine::{SttError, Transcriber};
pub use transcribe::{Segment, Transcript};
#[cfg(feature = "whisper")]
pub use whisper::WhisperTranscriber;

/// Build the transcriber selected by `config.stt.provider`.
///
/// # Errors
///
/// [`SttError::Unsupported`] when `Whisper` is selected in a build without
/// the `whisper` feature; model-loading errors otherwise.
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn Transcriber>, SttError> {
    match config.stt.provider {
        SttProvider::Api => Ok(Arc::new(ApiTranscriber::from_config(&config.stt))),
        #[cfg(feature = "whisper")]
        SttProvider::Whisper => {
            let path = whisper::model_path(&config.data_dir().join("models"), &config.stt.model);
            Ok(Arc::new(WhisperTranscriber::load(&path, &config.stt.language)?))
        }
        #[cfg(not(feature = "whisper"))]
        SttProvider::Whisper => Err(SttError::Unsupported(
            "stt.provider = \"Whisper\" requires a build with `--features whisper`".into(),
        )),
    }
}
