//! Offline synthesis with `espeak-ng`.
//!
//! espeak writes WAV only, so the result is transcoded to MP3 with ffmpeg
//! before it lands at the requested output path.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::TtsConfig;
use crate::ids::Locale;
use crate::media::run_tool;

use super::{SpeechSynthesizer, TtsError};

#[derive(Debug, Clone)]
pub struct EspeakSynthesizer {
    espeak: PathBuf,
    ffmpeg: PathBuf,
    rate: u32,
}

impl EspeakSynthesizer {
    pub fn new(config: &TtsConfig, ffmpeg: &Path) -> Self {
        Self {
            espeak: config.espeak_path.clone(),
            ffmpeg: ffmpeg.to_path_buf(),
            rate: config.rate,
        }
    }
}

/// espeak-ng voice for each locale.
pub fn voice(locale: Locale) -> &'static str {
    match locale {
        Locale::Es => "es",
        Locale::En => "en-us",
        Locale::Pt => "pt-br",
        Locale::It => "it",
        Locale::Fr => "fr-fr",
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    async fn synthesize(&self, text: &str, locale: Locale, output: &Path) -> Result<(), TtsError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let wav = tempfile::Builder::new()
            .prefix(".espeak-")
            .suffix(".wav")
            .tempfile_in(dir)
            .map_err(|e| TtsError::io(dir, e))?;

        let rate = self.rate.to_string();
        run_tool(
            &self.espeak,
            [
                OsStr::new("-v"),
                OsStr::new(voice(locale)),
                OsStr::new("-s"),
                OsStr::new(&rate),
                OsStr::new("-w"),
                wav.path().as_os_str(),
                OsStr::new("--stdin"),
            ],
            Some(text.as_bytes()),
        )
        .await?;

        run_tool(
            &self.ffmpeg,
            [
                OsStr::new("-y"),
                OsStr::new("-loglevel"),
                OsStr::new("error"),
                OsStr::new("-i"),
                wav.path().as_os_str(),
                OsStr::new("-codec:a"),
                OsStr::new("libmp3lame"),
                OsStr::new("-q:a"),
                OsStr::new("4"),
                output.as_os_str(),
            ],
            None,
        )
        .await?;

        log::debug!("tts: espeak voice {} wrote {}", voice(locale), output.display());
        Ok(())
    }
}
