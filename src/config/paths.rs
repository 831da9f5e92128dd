//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\videoconv\
//!   macOS:   ~/Library/Application Support/videoconv/
//!   Linux:   ~/.config/videoconv/
//!
//! Data dir (job state, uploads, artifacts, models):
//!   Windows: %LOCALAPPDATA%\videoconv\
//!   macOS:   ~/Library/Application Support/videoconv/
//!   Linux:   ~/.local/share/videoconv/

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default root for job data.
    pub data_dir: PathBuf,
    /// Directory for downloaded GGML model files.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "videoconv";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let models_dir = data_dir.join("models");

        Self {
            config_dir,
            settings_file,
            data_dir,
            models_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// Directories derived from a data root.
#[derive(Debug, Clone)]
pub struct DataLayout {
    /// One JSON document per job.
    pub state_dir: PathBuf,
    /// Stored uploads, `<job_id>.<ext>`.
    pub videos_dir: PathBuf,
    /// Generated artifacts, partitioned by job.
    pub artifacts_dir: PathBuf,
}

impl DataLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            state_dir: root.join("state"),
            videos_dir: root.join("videos"),
            artifacts_dir: root.join("artifacts"),
        }
    }
}
