//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]` so a partial `settings.toml` only
//! overrides the keys it names.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Where job state, uploaded videos and generated artifacts live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory.  `None` uses
    /// [`AppPaths::data_dir`].
    pub data_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Orchestrator behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound for a single stage-runner invocation, in seconds.
    pub stage_timeout_secs: u64,
    /// Maximum number of locales translated / synthesized concurrently.
    pub locale_concurrency: usize,
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: 1_800,
            locale_concurrency: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// ExtractionConfig
// ---------------------------------------------------------------------------

/// Settings for the ffmpeg audio-extraction step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// `ffmpeg` executable, resolved through `PATH` when not absolute.
    pub ffmpeg_path: PathBuf,
    /// Output sample rate in Hz.  Whisper expects 16 000.
    pub sample_rate: u32,
    /// Output channel count.  1 = mono.
    pub channels: u16,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// SttProvider / SttConfig
// ---------------------------------------------------------------------------

/// Selects which speech-to-text backend transcribes extracted audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SttProvider {
    /// Any OpenAI-compatible `/v1/audio/transcriptions` endpoint
    /// (faster-whisper-server, whisper.cpp server, OpenAI …).
    Api,
    /// In-process whisper.cpp via `whisper-rs` (requires the `whisper`
    /// cargo feature).
    Whisper,
}

impl Default for SttProvider {
    fn default() -> Self {
        Self::Api
    }
}

/// Settings for the transcription step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Which backend to use.
    pub provider: SttProvider,
    /// Model identifier.  For `Api` it is sent as the `model` form field;
    /// for `Whisper` it names `ggml-<model>.bin` under the models dir.
    pub model: String,
    /// Default spoken language as an ISO-639-1 code, or `"auto"` for
    /// language detection.  A per-job hint overrides it.
    pub language: String,
    /// Base URL of the transcription endpoint.
    pub base_url: String,
    /// API key; `None` for local servers.
    pub api_key: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            provider: SttProvider::default(),
            model: "small".into(),
            language: "auto".into(),
            base_url: "http://localhost:8000".into(),
            api_key: None,
            timeout_secs: 1_200,
        }
    }
}

// ---------------------------------------------------------------------------
// SummaryProvider / SummaryConfig
// ---------------------------------------------------------------------------

/// Selects how the transcript summary is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryProvider {
    /// Offline word-frequency sentence extraction.
    Extractive,
    /// Abstractive summary from the configured chat-completions endpoint.
    Llm,
}

impl Default for SummaryProvider {
    fn default() -> Self {
        Self::Extractive
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub provider: SummaryProvider,
    /// Maximum number of sentences kept in the summary.
    pub max_sentences: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            provider: SummaryProvider::default(),
            max_sentences: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Chat-completions endpoint used for translation and LLM summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the API endpoint.
    ///
    /// - Ollama default: `http://localhost:11434`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key; `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"qwen2.5:3b"`).
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).  Lower = more deterministic.
    pub temperature: f32,
    /// Maximum seconds to wait for a single response.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "qwen2.5:3b".into(),
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// TtsProvider / TtsConfig
// ---------------------------------------------------------------------------

/// Selects the speech-synthesis engine for summary audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TtsProvider {
    /// Google Translate TTS endpoint (what gTTS talks to), returns MP3.
    Gtts,
    /// Local `espeak-ng`, transcoded to MP3 through ffmpeg.
    Espeak,
}

impl Default for TtsProvider {
    fn default() -> Self {
        Self::Gtts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Primary engine.
    pub provider: TtsProvider,
    /// When the primary is `Gtts`, retry with `Espeak` on failure.
    pub fallback: bool,
    /// Base URL of the translate-TTS endpoint.
    pub gtts_base_url: String,
    /// `espeak-ng` executable.
    pub espeak_path: PathBuf,
    /// Speaking rate in words per minute (espeak only).
    pub rate: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            fallback: true,
            gtts_base_url: "https://translate.google.com".into(),
            espeak_path: PathBuf::from("espeak-ng"),
            rate: 180,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use videoconv::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub extraction: ExtractionConfig,
    pub stt: SttConfig,
    pub summary: SummaryConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Root under which `state/`, `videos/` and `artifacts/` are created.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().data_dir)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(
            original.pipeline.stage_timeout_secs,
            loaded.pipeline.stage_timeout_secs
        );
        assert_eq!(original.extraction.ffmpeg_path, loaded.extraction.ffmpeg_path);
        assert_eq!(original.extraction.sample_rate, loaded.extraction.sample_rate);
        assert_eq!(original.stt.provider, loaded.stt.provider);
        assert_eq!(original.stt.language, loaded.stt.language);
        assert_eq!(original.summary.max_sentences, loaded.summary.max_sentences);
        assert_eq!(original.llm.model, loaded.llm.model);
        assert_eq!(original.llm.api_key, loaded.llm.api_key);
        assert_eq!(original.tts.provider, loaded.tts.provider);
        assert_eq!(original.tts.rate, loaded.tts.rate);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.stt.provider, SttProvider::Api);
        assert_eq!(config.summary.provider, SummaryProvider::Extractive);
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.extraction.sample_rate, 16_000);
        assert_eq!(cfg.extraction.channels, 1);
        assert_eq!(cfg.summary.max_sentences, 4);
        assert_eq!(cfg.tts.provider, TtsProvider::Gtts);
        assert!(cfg.tts.fallback);
        assert_eq!(cfg.tts.rate, 180);
        assert_eq!(cfg.pipeline.stage_timeout(), Duration::from_secs(1_800));
    }

    /// A partial file only overrides what it names.
    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[storage]\ndata_dir = \"/srv/videoconv\"\n\n[tts]\nprovider = \"Espeak\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.data_dir(), PathBuf::from("/srv/videoconv"));
        assert_eq!(cfg.tts.provider, TtsProvider::Espeak);
        assert_eq!(cfg.tts.rate, 180);
        assert_eq!(cfg.llm.base_url, "http://localhost:11434");
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.stt.provider = SttProvider::Whisper;
        cfg.stt.language = "es".into();
        cfg.llm.api_key = Some("sk-test".into());
        cfg.summary.provider = SummaryProvider::Llm;
        cfg.pipeline.locale_concurrency = 5;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.stt.provider, SttProvider::Whisper);
        assert_eq!(loaded.stt.language, "es");
        assert_eq!(loaded.llm.api_key, Some("sk-test".into()));
        assert_eq!(loaded.summary.provider, SummaryProvider::Llm);
        assert_eq!(loaded.pipeline.locale_concurrency, 5);
    }
}
