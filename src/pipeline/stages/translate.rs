//! Translation(locale): transcript + summary → `<locale>.vtt` and
//! `summary.<locale>.txt`.
//!
//! Segment timings are kept; only cue text is translated.  When the
//! transcript is already in the target language both texts are copied
//! as they are.

use std::sync::Arc;

use async_trait::async_trait;

use crate::artifact::{Artifact, ArtifactKind, ArtifactStore};
use crate::ids::Locale;
use crate::llm::{LlmError, Translator};
use crate::pipeline::{StageError, StageInput, StageName, StageRunner};
use crate::stt::{Segment, Transcript};
use crate::subtitles::to_vtt;

use super::{capability_error, commit, prepare_text, read_text, read_transcript};

pub struct TranslationStage {
    store: ArtifactStore,
    translator: Arc<dyn Translator>,
}

impl TranslationStage {
    pub fn new(store: ArtifactStore, translator: Arc<dyn Translator>) -> Self {
        Self { store, translator }
    }

    async fn translate(
        &self,
        transcript: &Transcript,
        summary: &str,
        locale: Locale,
    ) -> Result<(Vec<Segment>, String), StageError> {
        let source = transcript.language.as_deref();
        let fail = |e: LlmError| capability_error(StageName::Translation, e);

        let texts: Vec<String> = transcript.segments.iter().map(|s| s.text.clone()).collect();
        let translated = self
            .translator
            .translate_batch(&texts, locale, source)
            .await
            .map_err(fail)?;
        if translated.len() != texts.len() {
            return Err(StageError::new(
                StageName::Translation.failure_kind(),
                format!(
                    "translator returned {} line(s) for {} segment(s)",
                    translated.len(),
                    texts.len()
                ),
            ));
        }

        let segments = transcript
            .segments
            .iter()
            .zip(translated)
            .map(|(seg, text)| Segment::new(seg.start, seg.end, text))
            .collect();
        let summary = self
            .translator
            .translate(summary, locale, source)
            .await
            .map_err(fail)?;
        Ok((segments, summary))
    }
}

#[async_trait]
impl StageRunner for TranslationStage {
    fn stage(&self) -> StageName {
        StageName::Translation
    }

    async fn run(&self, input: &StageInput) -> Result<Vec<Artifact>, StageError> {
        let locale = input.require_locale()?;
        let transcript = read_transcript(input).await?;
        let summary = read_text(input, ArtifactKind::SummaryText).await?;

        let spoken = transcript
            .language
            .as_deref()
            .and_then(Locale::from_language_tag);
        let (segments, summary) = if spoken == Some(locale) {
            log::info!("job {}: transcript already in {locale}, copying", input.job_id);
            (transcript.segments.clone(), summary)
        } else {
            self.translate(&transcript, &summary, locale).await?
        };

        let subtitles = prepare_text(
            &self.store,
            input,
            ArtifactKind::SubtitleTranslated,
            Some(locale),
            &to_vtt(&segments),
        )?;
        let summary = prepare_text(
            &self.store,
            input,
            ArtifactKind::SummaryTranslated,
            Some(locale),
            summary.trim(),
        )?;
        Ok(vec![commit(subtitles)?, commit(summary)?])
    }
}
