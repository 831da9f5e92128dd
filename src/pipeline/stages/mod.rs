//! Concrete stage runners.
//!
//! Each runner adapts one capability (ffmpeg, a [`Transcriber`], a
//! [`Summarizer`], a [`Translator`], a [`SpeechSynthesizer`]) to the
//! [`StageRunner`](super::StageRunner) contract:
//!
//! ```text
//! StageInput ──► read dependency artifacts ──► capability ──► AtomicArtifact ──► commit
//! ```
//!
//! Error mapping is uniform: a capability failure carries the stage's own
//! [`ErrorKind`] (see [`StageName::failure_kind`]), a missing or unreadable
//! dependency artifact is `InvalidInput`, and a failed artifact write is
//! `StorageFailure`.

pub mod extract;
pub mod subtitles;
pub mod summarize;
pub mod synthesize;
pub mod transcribe;
pub mod translate;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::artifact::{Artifact, ArtifactError, ArtifactKind, ArtifactStore, AtomicArtifact};
use crate::config::AppConfig;
use crate::ids::Locale;
use crate::llm::{ApiTranslator, ChatClient, Translator};
use crate::media::{AudioExtractor, FfmpegExtractor};
use crate::stt::{Transcriber, Transcript};
use crate::summary::Summarizer;
use crate::tts::SpeechSynthesizer;

use super::error::StageError;
use super::stage::{StageInput, StageRunners};
use super::state::StageName;

pub use extract::AudioExtractionStage;
pub use subtitles::SubtitleExportStage;
pub use summarize::SummarizationStage;
pub use synthesize::SpeechSynthesisStage;
pub use transcribe::TranscriptionStage;
pub use translate::TranslationStage;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// The external capabilities the stage runners are built on.
#[derive(Clone)]
pub struct Capabilities {
    pub extractor: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub summarizer: Arc<dyn Summarizer>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Capabilities {
    /// Production providers as selected by `config`.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let transcriber =
            crate::stt::from_config(config).context("failed to initialise the transcriber")?;
        Ok(Self {
            extractor: Arc::new(FfmpegExtractor::from_config(&config.extraction)),
            transcriber,
            summarizer: crate::summary::from_config(config),
            translator: Arc::new(ApiTranslator::new(ChatClient::from_config(&config.llm))),
            synthesizer: crate::tts::from_config(config),
        })
    }

    /// Wrap every capability in its stage runner, all writing to `store`.
    pub fn into_runners(self, store: ArtifactStore) -> StageRunners {
        StageRunners {
            audio_extraction: Arc::new(AudioExtractionStage::new(store.clone(), self.extractor)),
            transcription: Arc::new(TranscriptionStage::new(store.clone(), self.transcriber)),
            subtitle_export: Arc::new(SubtitleExportStage::new(store.clone())),
            summarization: Arc::new(SummarizationStage::new(store.clone(), self.summarizer)),
            translation: Arc::new(TranslationStage::new(store.clone(), self.translator)),
            speech_synthesis: Arc::new(SpeechSynthesisStage::new(store, self.synthesizer)),
        }
    }
}

/// Production runners for `config`, writing artifacts into `store`.
pub fn runners_from_config(config: &AppConfig, store: ArtifactStore) -> anyhow::Result<StageRunners> {
    Ok(Capabilities::from_config(config)?.into_runners(store))
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn storage(err: ArtifactError) -> StageError {
    StageError::storage(err)
}

/// Open the scoped writer for an output of `input`'s job.
fn create(
    store: &ArtifactStore,
    input: &StageInput,
    kind: ArtifactKind,
    locale: Option<Locale>,
) -> Result<AtomicArtifact, StageError> {
    store.create(&input.job_id, kind, locale).map_err(storage)
}

/// Write `content` into a fresh artifact, without committing it.
fn prepare_text(
    store: &ArtifactStore,
    input: &StageInput,
    kind: ArtifactKind,
    locale: Option<Locale>,
    content: &str,
) -> Result<AtomicArtifact, StageError> {
    let mut writer = create(store, input, kind, locale)?;
    writer.write_all(content.as_bytes()).map_err(storage)?;
    Ok(writer)
}

fn commit(writer: AtomicArtifact) -> Result<Artifact, StageError> {
    writer.commit().map_err(storage)
}

fn capability_error(stage: StageName, err: impl std::fmt::Display) -> StageError {
    StageError::new(stage.failure_kind(), err.to_string())
}

async fn read_input(path: &Path) -> Result<String, StageError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        StageError::invalid_input(format!("cannot read {}: {e}", path.display()))
    })
}

async fn read_transcript(input: &StageInput) -> Result<Transcript, StageError> {
    let artifact = input.input(ArtifactKind::Transcript)?;
    let raw = read_input(&artifact.path).await?;
    serde_json::from_str(&raw).map_err(|e| {
        StageError::invalid_input(format!("corrupt transcript {}: {e}", artifact.path.display()))
    })
}

async fn read_text(input: &StageInput, kind: ArtifactKind) -> Result<String, StageError> {
    let artifact = input.input(kind)?;
    read_input(&artifact.path).await
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;

    use super::*;
    use crate::stt::Segment;

    pub fn input(locale: Option<Locale>, inputs: Vec<Artifact>) -> StageInput {
        StageInput {
            job_id: "J1".parse().unwrap(),
            source_video: PathBuf::from("/videos/J1.mp4"),
            source_language: None,
            locale,
            inputs,
        }
    }

    pub fn transcript() -> Transcript {
        Transcript::new(
            Some("es".into()),
            vec![
                Segment::new(0.0, 1.5, "Hola a todos."),
                Segment::new(1.5, 3.25, "Bienvenidos al canal."),
            ],
        )
    }

    /// Commit `content` as an artifact of job `J1`.
    pub fn put(
        store: &ArtifactStore,
        kind: ArtifactKind,
        locale: Option<Locale>,
        content: &str,
    ) -> Artifact {
        let mut w = store.create(&"J1".parse().unwrap(), kind, locale).unwrap();
        w.write_all(content.as_bytes()).unwrap();
        w.commit().unwrap()
    }

    pub fn put_transcript(store: &ArtifactStore, t: &Transcript) -> Artifact {
        put(
            store,
            ArtifactKind::Transcript,
            None,
            &serde_json::to_string(t).unwrap(),
        )
    }
}
