//! SubtitleExport: transcript → `base.srt` + `base.vtt`.

use async_trait::async_trait;

use crate::artifact::{Artifact, ArtifactKind, ArtifactStore};
use crate::pipeline::{StageError, StageInput, StageName, StageRunner};
use crate::subtitles::{to_srt, to_vtt};

use super::{commit, prepare_text, read_transcript};

pub struct SubtitleExportStage {
    store: ArtifactStore,
}

impl SubtitleExportStage {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StageRunner for SubtitleExportStage {
    fn stage(&self) -> StageName {
        StageName::SubtitleExport
    }

    async fn run(&self, input: &StageInput) -> Result<Vec<Artifact>, StageError> {
        let transcript = read_transcript(input).await?;

        // Both files are fully written before either is committed.
        let srt = prepare_text(
            &self.store,
            input,
            ArtifactKind::SubtitleSrt,
            None,
            &to_srt(&transcript.segments),
        )?;
        let vtt = prepare_text(
            &self.store,
            input,
            ArtifactKind::SubtitleVtt,
            None,
            &to_vtt(&transcript.segments),
        )?;
        Ok(vec![commit(srt)?, commit(vtt)?])
    }
}
