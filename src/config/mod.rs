//! Configuration module for videoconv.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each pipeline
//! capability, `AppPaths` for cross-platform directories, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::{AppPaths, DataLayout};
pub use settings::{
    AppConfig, ExtractionConfig, LlmConfig, PipelineConfig, StorageConfig, SttConfig,
    SttProvider, SummaryConfig, SummaryProvider, TtsConfig, TtsProvider,
};
