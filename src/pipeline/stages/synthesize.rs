//! SpeechSynthesis(locale): `summary.<locale>.txt` → `summary.<locale>.mp3`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::artifact::{Artifact, ArtifactKind, ArtifactStore};
use crate::pipeline::{StageError, StageInput, StageName, StageRunner};
use crate::tts::SpeechSynthesizer;

use super::{capability_error, commit, create, read_text};

pub struct SpeechSynthesisStage {
    store: ArtifactStore,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl SpeechSynthesisStage {
    pub fn new(store: ArtifactStore, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { store, synthesizer }
    }
}

#[async_trait]
impl StageRunner for SpeechSynthesisStage {
    fn stage(&self) -> StageName {
        StageName::SpeechSynthesis
    }

    async fn run(&self, input: &StageInput) -> Result<Vec<Artifact>, StageError> {
        let locale = input.require_locale()?;
        let text = read_text(input, ArtifactKind::SummaryTranslated).await?;

        let writer = create(&self.store, input, ArtifactKind::SummaryAudio, Some(locale))?;
        self.synthesizer
            .synthesize(&text, locale, writer.path())
            .await
            .map_err(|e| capability_error(self.stage(), e))?;
        Ok(vec![commit(writer)?])
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::ids::Locale;
    use crate::pipeline::stages::testing::{input, put};
    use crate::pipeline::ErrorKind;
    use crate::tts::TtsError;

    struct Recorder;

    #[async_trait]
    impl SpeechSynthesizer for Recorder {
        async fn synthesize(&self, text: &str, locale: Locale, output: &Path) -> Result<(), TtsError> {
            assert_eq!(output.extension().unwrap(), "mp3");
            std::fs::write(output, format!("{locale}:{text}")).map_err(|e| TtsError::io(output, e))
        }
    }

    struct Broken;

    #[async_trait]
    impl SpeechSynthesizer for Broken {
        async fn synthesize(&self, _: &str, _: Locale, _: &Path) -> Result<(), TtsError> {
            Err(TtsError::EmptyAudio)
        }
    }

    #[tokio::test]
    async fn writes_locale_audio() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let summary = put(&store, ArtifactKind::SummaryTranslated, Some(Locale::Pt), "Olá.");

        let out = SpeechSynthesisStage::new(store, Arc::new(Recorder))
            .run(&input(Some(Locale::Pt), vec![summary]))
            .await
            .unwrap();
        assert_eq!(out[0].kind, ArtifactKind::SummaryAudio);
        assert!(out[0].path.ends_with("summary/summary.pt.mp3"));
        assert_eq!(std::fs::read_to_string(&out[0].path).unwrap(), "pt:Olá.");
    }

    #[tokio::test]
    async fn failure_is_synthesis_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let summary = put(&store, ArtifactKind::SummaryTranslated, Some(Locale::Fr), "Salut.");

        let err = SpeechSynthesisStage::new(store.clone(), Arc::new(Broken))
            .run(&input(Some(Locale::Fr), vec![summary]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::SynthesisFailed);
        let mp3 = store
            .locate(&"J1".parse().unwrap(), ArtifactKind::SummaryAudio, Some(Locale::Fr))
            .unwrap();
        assert!(!mp3.exists());
    }
}
