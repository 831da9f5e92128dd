//! Summarization: transcript → `summary/summary.txt`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::artifact::{Artifact, ArtifactKind, ArtifactStore};
use crate::pipeline::{StageError, StageInput, StageName, StageRunner};
use crate::summary::Summarizer;

use super::{capability_error, commit, prepare_text, read_transcript};

pub struct SummarizationStage {
    store: ArtifactStore,
    summarizer: Arc<dyn Summarizer>,
}

impl SummarizationStage {
    pub fn new(store: ArtifactStore, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { store, summarizer }
    }
}

#[async_trait]
impl StageRunner for SummarizationStage {
    fn stage(&self) -> StageName {
        StageName::Summarization
    }

    async fn run(&self, input: &StageInput) -> Result<Vec<Artifact>, StageError> {
        let transcript = read_transcript(input).await?;
        let summary = self
            .summarizer
            .summarize(&transcript)
            .await
            .map_err(|e| capability_error(self.stage(), e))?;

        let writer = prepare_text(
            &self.store,
            input,
            ArtifactKind::SummaryText,
            None,
            summary.trim(),
        )?;
        Ok(vec![commit(writer)?])
    }
}
