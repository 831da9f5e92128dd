//! Uniform stage-runner contract.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::artifact::{Artifact, ArtifactKind};
use crate::ids::{JobId, Locale};

use super::error::StageError;
use super::state::StageName;

/// Everything a runner needs for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct StageInput {
    pub job_id: JobId,
    pub source_video: PathBuf,
    pub source_language: Option<String>,
    /// Set for per-locale stages only.
    pub locale: Option<Locale>,
    /// Outputs of the dependency stages, in dependency order.
    pub inputs: Vec<Artifact>,
}

impl StageInput {
    /// The dependency output of `kind`, or `InvalidInput` if it is missing.
    pub fn input(&self, kind: ArtifactKind) -> Result<&Artifact, StageError> {
        self.inputs
            .iter()
            .find(|a| a.kind == kind)
            .ok_or_else(|| StageError::invalid_input(format!("missing input artifact: {kind}")))
    }

    pub fn require_locale(&self) -> Result<Locale, StageError> {
        self.locale
            .ok_or_else(|| StageError::invalid_input("per-locale stage invoked without a locale"))
    }
}

/// One pipeline stage.
///
/// Implementations must write every output through
/// [`AtomicArtifact`](crate::artifact::AtomicArtifact) so that a failed,
/// timed-out or cancelled run never leaves a file at a canonical path.
#[async_trait]
pub trait StageRunner: Send + Sync {
    fn stage(&self) -> StageName;

    async fn run(&self, input: &StageInput) -> Result<Vec<Artifact>, StageError>;
}

/// The full set of runners, one per stage.
#[derive(Clone)]
pub struct StageRunners {
    pub audio_extraction: Arc<dyn StageRunner>,
    pub transcription: Arc<dyn StageRunner>,
    pub subtitle_export: Arc<dyn StageRunner>,
    pub summarization: Arc<dyn StageRunner>,
    pub translation: Arc<dyn StageRunner>,
    pub speech_synthesis: Arc<dyn StageRunner>,
}

impl StageRunners {
    pub fn get(&self, stage: StageName) -> &Arc<dyn StageRunner> {
        match stage {
            StageName::AudioExtraction => &self.audio_extraction,
            StageName::Transcription => &self.transcription,
            StageName::SubtitleExport => &self.subtitle_export,
            StageName::Summarization => &self.summarization,
            StageName::Translation => &self.translation,
            StageName::SpeechSynthesis => &self.speech_synthesis,
        }
    }
}
