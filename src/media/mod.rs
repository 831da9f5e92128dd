//! Audio extraction from uploaded videos.
//!
//! [`AudioExtractor`] is the capability used by the AudioExtraction stage;
//! [`FfmpegExtractor`] is the production implementation:
//!
//! ```text
//! ffmpeg -y -i <video> -vn -acodec pcm_s16le -ar 16000 -ac 1 <out.wav>
//! ```

pub mod process;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ExtractionConfig;

pub use process::{run_tool, ToolError};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("source video not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Turns a video into a mono 16-bit PCM WAV file at `output`.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract(&self, video: &Path, output: &Path) -> Result<(), ExtractError>;
}

/// Shells out to ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    config: ExtractionConfig,
}

impl FfmpegExtractor {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn args(&self, video: &Path, output: &Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = vec!["-y".into(), "-i".into(), video.into()];
        for a in [
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ar".to_string(),
            self.config.sample_rate.to_string(),
            "-ac".to_string(),
            self.config.channels.to_string(),
        ] {
            args.push(a.into());
        }
        args.push(output.into());
        args
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract(&self, video: &Path, output: &Path) -> Result<(), ExtractError> {
        if !video.is_file() {
            return Err(ExtractError::MissingSource(video.to_path_buf()));
        }
        run_tool(&self.config.ffmpeg_path, self.args(video, output), None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn args_follow_extraction_config() {
        let ex = FfmpegExtractor::from_config(&ExtractionConfig::default());
        let args: Vec<String> = ex
            .args(Path::new("in.mp4"), Path::new("out.wav"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-y", "-i", "in.mp4", "-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1",
                "out.wav"
            ]
        );
    }

    #[tokio::test]
    async fn missing_video_is_rejected_before_running_ffmpeg() {
        let ex = FfmpegExtractor::from_config(&ExtractionConfig::default());
        let err = ex
            .extract(Path::new("/nonexistent.mp4"), Path::new("/tmp/out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingSource(_)));
    }

    #[tokio::test]
    async fn missing_ffmpeg_is_not_found() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("v.mp4");
        std::fs::write(&video, b"x").unwrap();

        let ex = FfmpegExtractor::from_config(&ExtractionConfig {
            ffmpeg_path: dir.path().join("no-ffmpeg"),
            ..Default::default()
        });
        let err = ex.extract(&video, &dir.path().join("a.wav")).await.unwrap_err();
        assert!(matches!(err, ExtractError::Tool(ToolError::NotFound(_))));
    }
}
