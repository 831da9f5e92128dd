//! Transcription: `audio.wav` → `transcript/transcript.json`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::artifact::{Artifact, ArtifactKind, ArtifactStore};
use crate::pipeline::{StageError, StageInput, StageName, StageRunner};
use crate::stt::Transcriber;

use super::{capability_error, commit, prepare_text};

pub struct TranscriptionStage {
    store: ArtifactStore,
    transcriber: Arc<dyn Transcriber>,
}

impl TranscriptionStage {
    pub fn new(store: ArtifactStore, transcriber: Arc<dyn Transcriber>) -> Self {
        Self { store, transcriber }
    }
}

#[async_trait]
impl StageRunner for TranscriptionStage {
    fn stage(&self) -> StageName {
        StageName::Transcription
    }

    async fn run(&self, input: &StageInput) -> Result<Vec<Artifact>, StageError> {
        let audio = input.input(ArtifactKind::Audio)?;
        let hint = input.source_language.as_deref();

        let mut transcript = self
            .transcriber
            .transcribe(&audio.path, hint)
            .await
            .map_err(|e| capability_error(self.stage(), e))?;
        // A user-supplied language wins over detection.
        if let Some(hint) = hint {
            transcript.language = Some(hint.to_lowercase());
        }
        log::info!(
            "job {}: transcribed {} segment(s), language {}",
            input.job_id,
            transcript.segments.len(),
            transcript.language.as_deref().unwrap_or("unknown")
        );

        let json = serde_json::to_string_pretty(&transcript).map_err(StageError::storage)?;
        let writer = prepare_text(&self.store, input, ArtifactKind::Transcript, None, &json)?;
        Ok(vec![commit(writer)?])
    }
}
