//! AudioExtraction: source video → `audio/audio.wav`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::artifact::{Artifact, ArtifactKind, ArtifactStore};
use crate::media::AudioExtractor;
use crate::pipeline::{StageError, StageInput, StageName, StageRunner};

use super::{capability_error, commit, create};

pub struct AudioExtractionStage {
    store: ArtifactStore,
    extractor: Arc<dyn AudioExtractor>,
}

impl AudioExtractionStage {
    pub fn new(store: ArtifactStore, extractor: Arc<dyn AudioExtractor>) -> Self {
        Self { store, extractor }
    }
}

#[async_trait]
impl StageRunner for AudioExtractionStage {
    fn stage(&self) -> StageName {
        StageName::AudioExtraction
    }

    async fn run(&self, input: &StageInput) -> Result<Vec<Artifact>, StageError> {
        let writer = create(&self.store, input, ArtifactKind::Audio, None)?;
        self.extractor
            .extract(&input.source_video, writer.path())
            .await
            .map_err(|e| capability_error(self.stage(), e))?;
        Ok(vec![commit(writer)?])
    }
}
