//! Job record and per-stage state machine.
//!
//! [`Job`] is the single source of truth for "is this stage done".  It is
//! loaded, transitioned and persisted by the orchestrator only; artifact
//! presence on disk is never consulted.
//!
//! # Stage dependencies
//!
//! ```text
//! AudioExtraction ──▶ Transcription ──┬──▶ SubtitleExport
//!                                     ├──▶ Summarization ──┐
//!                                     └────────────────────┴──▶ Translation(l) ──▶ SpeechSynthesis(l)
//! ```
//!
//! # Unit state machine
//!
//! ```text
//! pending ──▶ running ──▶ done
//!                  └────▶ failed ──(next advance)──▶ running
//! running (found on load) ──▶ failed { Interrupted }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::ids::{JobId, Locale};

use super::error::{ErrorKind, StageError};
use super::stage::StageInput;

// ---------------------------------------------------------------------------
// StageName
// ---------------------------------------------------------------------------

/// The pipeline stages, declared in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageName {
    AudioExtraction,
    Transcription,
    SubtitleExport,
    Summarization,
    Translation,
    SpeechSynthesis,
}

impl StageName {
    /// Every stage, in an order where dependencies always come first.
    pub const ALL: [StageName; 6] = [
        StageName::AudioExtraction,
        StageName::Transcription,
        StageName::SubtitleExport,
        StageName::Summarization,
        StageName::Translation,
        StageName::SpeechSynthesis,
    ];

    /// Direct dependencies.  For per-locale stages a per-locale dependency
    /// means "the same locale of that stage".
    pub fn dependencies(self) -> &'static [StageName] {
        match self {
            StageName::AudioExtraction => &[],
            StageName::Transcription => &[StageName::AudioExtraction],
            StageName::SubtitleExport => &[StageName::Transcription],
            StageName::Summarization => &[StageName::Transcription],
            StageName::Translation => &[StageName::Transcription, StageName::Summarization],
            StageName::SpeechSynthesis => &[StageName::Summarization, StageName::Translation],
        }
    }

    /// Stages that depend on `self`, directly or transitively, in order.
    pub fn dependents(self) -> Vec<StageName> {
        let mut affected = vec![self];
        for stage in Self::ALL {
            if stage.dependencies().iter().any(|d| affected.contains(d)) {
                affected.push(stage);
            }
        }
        affected.remove(0);
        affected
    }

    /// `true` for stages that run once per requested locale.
    pub fn is_per_locale(self) -> bool {
        matches!(self, StageName::Translation | StageName::SpeechSynthesis)
    }

    /// Error kind a runner of this stage reports for its own failures.
    pub fn failure_kind(self) -> ErrorKind {
        match self {
            StageName::AudioExtraction => ErrorKind::ExtractionFailed,
            StageName::Transcription => ErrorKind::TranscriptionFailed,
            StageName::SubtitleExport => ErrorKind::StorageFailure,
            StageName::Summarization => ErrorKind::SummarizationFailed,
            StageName::Translation => ErrorKind::TranslationFailed,
            StageName::SpeechSynthesis => ErrorKind::SynthesisFailed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StageName::AudioExtraction => "AudioExtraction",
            StageName::Transcription => "Transcription",
            StageName::SubtitleExport => "SubtitleExport",
            StageName::Summarization => "Summarization",
            StageName::Translation => "Translation",
            StageName::SpeechSynthesis => "SpeechSynthesis",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for StageName {
    type Err = String;

    /// Accepts the canonical name case-insensitively (`"translation"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown stage: {s}"))
    }
}

// ---------------------------------------------------------------------------
// StageUnit
// ---------------------------------------------------------------------------

/// One schedulable piece of work: a stage, plus a locale for the per-locale
/// stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageUnit {
    pub stage: StageName,
    pub locale: Option<Locale>,
}

impl StageUnit {
    pub fn base(stage: StageName) -> Self {
        Self {
            stage,
            locale: None,
        }
    }

    pub fn localized(stage: StageName, locale: Locale) -> Self {
        Self {
            stage,
            locale: Some(locale),
        }
    }
}

impl fmt::Display for StageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.locale {
            Some(l) => write!(f, "{}[{}]", self.stage, l),
            None => write!(f, "{}", self.stage),
        }
    }
}

// ---------------------------------------------------------------------------
// StageState / StageStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

impl StageState {
    pub fn label(self) -> &'static str {
        match self {
            StageState::Pending => "pending",
            StageState::Running => "running",
            StageState::Done => "done",
            StageState::Failed => "failed",
        }
    }
}

/// Progress of one stage.
///
/// For per-locale stages `locales` holds one nested status per requested
/// locale and the top-level fields are an aggregate maintained by
/// [`Job::refresh_aggregates`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageStatus {
    pub state: StageState,
    #[serde(default)]
    pub output_refs: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StageError>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub locales: BTreeMap<Locale, StageStatus>,
}

impl StageStatus {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.state == StageState::Done
    }

    fn mark_running(&mut self) {
        self.state = StageState::Running;
        self.error = None;
    }

    fn mark_done(&mut self, outputs: Vec<Artifact>) {
        self.state = StageState::Done;
        self.output_refs = outputs;
        self.error = None;
    }

    fn mark_failed(&mut self, error: StageError) {
        self.state = StageState::Failed;
        self.output_refs.clear();
        self.error = Some(error);
    }

    fn reset(&mut self) {
        self.state = StageState::Pending;
        self.output_refs.clear();
        self.error = None;
    }

    /// Recompute the top-level fields from the locale entries.
    fn aggregate_locales(&mut self) {
        let states: Vec<StageState> = self.locales.values().map(|s| s.state).collect();
        self.state = if states.contains(&StageState::Running) {
            StageState::Running
        } else if states.contains(&StageState::Failed) {
            StageState::Failed
        } else if states.contains(&StageState::Pending) {
            StageState::Pending
        } else {
            StageState::Done
        };

        self.output_refs = self
            .locales
            .values()
            .filter(|s| s.is_done())
            .flat_map(|s| s.output_refs.iter().cloned())
            .collect();

        let failures: Vec<(Locale, &StageError)> = self
            .locales
            .iter()
            .filter_map(|(l, s)| s.error.as_ref().map(|e| (*l, e)))
            .collect();

        self.error = match (self.state, failures.first()) {
            (StageState::Failed, Some((_, first))) => {
                let detail = failures
                    .iter()
                    .map(|(l, e)| format!("{l}: {}", e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                Some(StageError::new(first.kind, detail))
            }
            _ => None,
        };
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Persisted record of a job's progress across all stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub source_video_ref: PathBuf,
    /// Spoken-language hint for transcription; `None` = auto-detect.
    #[serde(default)]
    pub source_language: Option<String>,
    #[serde(default)]
    pub target_languages: BTreeSet<Locale>,
    #[serde(default)]
    pub stages: BTreeMap<StageName, StageStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A fresh job with every stage `pending`.
    pub fn new(
        job_id: JobId,
        source_video_ref: PathBuf,
        source_language: Option<String>,
        target_languages: BTreeSet<Locale>,
    ) -> Self {
        let now = Utc::now();
        let mut job = Self {
            job_id,
            source_video_ref,
            source_language,
            target_languages,
            stages: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        };
        job.ensure_complete();
        job
    }

    pub fn stage(&self, stage: StageName) -> Option<&StageStatus> {
        self.stages.get(&stage)
    }

    /// Status of a single unit, if present.
    pub fn unit(&self, unit: StageUnit) -> Option<&StageStatus> {
        let status = self.stages.get(&unit.stage)?;
        match unit.locale {
            Some(l) => status.locales.get(&l),
            None => Some(status),
        }
    }

    fn unit_mut(&mut self, unit: StageUnit) -> &mut StageStatus {
        let status = self.stages.entry(unit.stage).or_default();
        match unit.locale {
            Some(l) => status.locales.entry(l).or_default(),
            None => status,
        }
    }

    /// Insert any missing stage or locale entry as `pending`.  Returns `true`
    /// when something was added.
    pub fn ensure_complete(&mut self) -> bool {
        let mut changed = false;
        for stage in StageName::ALL {
            let status = self.stages.entry(stage).or_insert_with(|| {
                changed = true;
                StageStatus::pending()
            });
            if stage.is_per_locale() {
                for locale in &self.target_languages {
                    status.locales.entry(*locale).or_insert_with(|| {
                        changed = true;
                        StageStatus::pending()
                    });
                }
            }
        }
        self.refresh_aggregates();
        changed
    }

    /// Recompute the aggregate status of every per-locale stage.
    ///
    /// A per-locale stage with no locales has nothing to run: it is `done`
    /// once its own dependencies are, and `pending` before that.
    pub fn refresh_aggregates(&mut self) {
        for stage in StageName::ALL.into_iter().filter(|s| s.is_per_locale()) {
            let ready = self.dependencies_met(StageUnit::base(stage));
            if let Some(status) = self.stages.get_mut(&stage) {
                status.aggregate_locales();
                if status.locales.is_empty() && !ready {
                    status.state = StageState::Pending;
                }
            }
        }
    }

    /// Add locales to the request.  Existing locales keep their progress.
    pub fn add_target_languages(&mut self, locales: &BTreeSet<Locale>) -> bool {
        let before = self.target_languages.len();
        self.target_languages.extend(locales.iter().copied());
        let added = self.target_languages.len() != before;
        if added {
            self.ensure_complete();
        }
        added
    }

    /// Turn every `running` unit into `failed { Interrupted }`.
    ///
    /// A unit can only be observed `running` here if the process that
    /// started it stopped before recording the outcome; external calls are
    /// not resumable, so the unit is retried from scratch.
    pub fn recover_interrupted(&mut self) -> Vec<StageUnit> {
        let mut recovered = Vec::new();
        for (stage, status) in self.stages.iter_mut() {
            if stage.is_per_locale() {
                for (locale, ls) in status.locales.iter_mut() {
                    if ls.state == StageState::Running {
                        ls.mark_failed(interrupted());
                        recovered.push(StageUnit::localized(*stage, *locale));
                    }
                }
            } else if status.state == StageState::Running {
                status.mark_failed(interrupted());
                recovered.push(StageUnit::base(*stage));
            }
        }
        if !recovered.is_empty() {
            self.refresh_aggregates();
        }
        recovered
    }

    /// Every unit of the job, in dependency order.
    pub fn units(&self) -> Vec<StageUnit> {
        let mut units = Vec::new();
        for stage in StageName::ALL {
            if stage.is_per_locale() {
                units.extend(
                    self.target_languages
                        .iter()
                        .map(|l| StageUnit::localized(stage, *l)),
                );
            } else {
                units.push(StageUnit::base(stage));
            }
        }
        units
    }

    /// `true` when every dependency of `unit` is `done`.
    pub fn dependencies_met(&self, unit: StageUnit) -> bool {
        unit.stage.dependencies().iter().all(|dep| {
            let dep_unit = match unit.locale {
                Some(l) if dep.is_per_locale() => StageUnit::localized(*dep, l),
                _ => StageUnit::base(*dep),
            };
            self.unit(dep_unit).is_some_and(StageStatus::is_done)
        })
    }

    /// `true` when `unit` is not done yet and can be attempted now.
    pub fn is_runnable(&self, unit: StageUnit) -> bool {
        let not_done = self.unit(unit).map_or(true, |s| !s.is_done());
        not_done && self.dependencies_met(unit)
    }

    /// Inputs for `unit`: the outputs of its dependencies.
    pub fn stage_input(&self, unit: StageUnit) -> StageInput {
        let mut inputs = Vec::new();
        for dep in unit.stage.dependencies() {
            let dep_unit = match unit.locale {
                Some(l) if dep.is_per_locale() => StageUnit::localized(*dep, l),
                _ => StageUnit::base(*dep),
            };
            if let Some(status) = self.unit(dep_unit) {
                inputs.extend(status.output_refs.iter().cloned());
            }
        }
        StageInput {
            job_id: self.job_id.clone(),
            source_video: self.source_video_ref.clone(),
            source_language: self.source_language.clone(),
            locale: unit.locale,
            inputs,
        }
    }

    pub fn begin(&mut self, unit: StageUnit) {
        self.unit_mut(unit).mark_running();
        self.refresh_aggregates();
    }

    pub fn finish(&mut self, unit: StageUnit, outcome: Result<Vec<Artifact>, StageError>) {
        let status = self.unit_mut(unit);
        match outcome {
            Ok(outputs) => status.mark_done(outputs),
            Err(error) => status.mark_failed(error),
        }
        self.refresh_aggregates();
    }

    /// Reset `stage` (one locale of it, when given) and everything that
    /// depends on it to `pending`.
    pub fn reset(&mut self, stage: StageName, locale: Option<Locale>) {
        let mut affected = vec![stage];
        affected.extend(stage.dependents());

        for name in affected {
            let Some(status) = self.stages.get_mut(&name) else {
                continue;
            };
            match (name.is_per_locale(), locale) {
                // Narrowed rerun: only the same locale of per-locale stages.
                (true, Some(l)) => {
                    if let Some(ls) = status.locales.get_mut(&l) {
                        ls.reset();
                    }
                }
                (true, None) => status.locales.values_mut().for_each(StageStatus::reset),
                (false, Some(_)) => {}
                (false, None) => status.reset(),
            }
        }
        self.refresh_aggregates();
    }

    /// `true` when every stage is `done`.
    pub fn is_complete(&self) -> bool {
        StageName::ALL
            .iter()
            .all(|s| self.stages.get(s).is_some_and(StageStatus::is_done))
    }

    /// Every current artifact, in stage order.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.stages
            .values()
            .filter(|s| !s.locales.is_empty() || s.is_done())
            .flat_map(|s| s.output_refs.iter().cloned())
            .collect()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn interrupted() -> StageError {
    StageError::new(
        ErrorKind::Interrupted,
        "stage was running when the previous process stopped",
    )
}

// ---------------------------------------------------------------------------
// JobSnapshot
// ---------------------------------------------------------------------------

/// What the query boundary returns: the job record plus a flat list of the
/// current artifacts for download links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    #[serde(flatten)]
    pub job: Job,
    pub artifacts: Vec<Artifact>,
    pub complete: bool,
}

impl From<Job> for JobSnapshot {
    fn from(job: Job) -> Self {
        let artifacts = job.artifacts();
        let complete = job.is_complete();
        Self {
            job,
            artifacts,
            complete,
        }
    }
}

impl JobSnapshot {
    pub fn stage(&self, stage: StageName) -> Option<&StageStatus> {
        self.job.stage(stage)
    }

    pub fn state(&self, stage: StageName) -> Option<StageState> {
        self.job.stage(stage).map(|s| s.state)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;

    fn job(locales: &[Locale]) -> Job {
        Job::new(
            "J1".parse().unwrap(),
            PathBuf::from("/videos/J1.mp4"),
            None,
            locales.iter().copied().collect(),
        )
    }

    fn artifact(kind: ArtifactKind, locale: Option<Locale>) -> Artifact {
        Artifact {
            kind,
            locale,
            path: PathBuf::from(format!("/a/{kind}")),
        }
    }

    fn done(job: &mut Job, unit: StageUnit) {
        job.begin(unit);
        job.finish(unit, Ok(vec![]));
    }

    // ---- StageName ---

    #[test]
    fn all_is_in_dependency_order() {
        for (i, stage) in StageName::ALL.iter().enumerate() {
            for dep in stage.dependencies() {
                let j = StageName::ALL.iter().position(|s| s == dep).unwrap();
                assert!(j < i, "{dep} must precede {stage}");
            }
        }
    }

    #[test]
    fn dependents_are_transitive() {
        assert_eq!(
            StageName::Transcription.dependents(),
            vec![
                StageName::SubtitleExport,
                StageName::Summarization,
                StageName::Translation,
                StageName::SpeechSynthesis
            ]
        );
        assert_eq!(
            StageName::Translation.dependents(),
            vec![StageName::SpeechSynthesis]
        );
        assert!(StageName::SubtitleExport.dependents().is_empty());
    }

    #[test]
    fn stage_name_parses_case_insensitively() {
        assert_eq!(
            "speechsynthesis".parse::<StageName>().unwrap(),
            StageName::SpeechSynthesis
        );
        assert!("mux".parse::<StageName>().is_err());
    }

    // ---- Job completeness ---

    #[test]
    fn new_job_has_every_stage() {
        let j = job(&[Locale::Es]);
        for stage in StageName::ALL {
            assert!(j.stage(stage).is_some());
        }
        assert_eq!(
            j.stage(StageName::Translation).unwrap().locales.len(),
            1
        );
    }

    #[test]
    fn ensure_complete_restores_missing_entries() {
        let mut j = job(&[Locale::Fr]);
        j.stages.remove(&StageName::Summarization);
        j.stages
            .get_mut(&StageName::SpeechSynthesis)
            .unwrap()
            .locales
            .clear();

        assert!(j.ensure_complete());
        assert_eq!(
            j.stage(StageName::Summarization).unwrap().state,
            StageState::Pending
        );
        assert!(j
            .unit(StageUnit::localized(StageName::SpeechSynthesis, Locale::Fr))
            .is_some());
        assert!(!j.ensure_complete());
    }

    // ---- Aggregation ---

    #[test]
    fn per_locale_stage_without_locales_follows_dependencies() {
        let mut j = job(&[]);
        assert_eq!(
            j.stage(StageName::Translation).unwrap().state,
            StageState::Pending
        );

        for s in [
            StageName::AudioExtraction,
            StageName::Transcription,
            StageName::Summarization,
        ] {
            done(&mut j, StageUnit::base(s));
        }
        let t = j.stage(StageName::Translation).unwrap();
        assert_eq!(t.state, StageState::Done);
        assert!(t.output_refs.is_empty());
        assert_eq!(
            j.stage(StageName::SpeechSynthesis).unwrap().state,
            StageState::Done
        );
    }

    #[test]
    fn aggregate_reports_failure_and_keeps_successful_outputs() {
        let mut j = job(&[Locale::Es, Locale::Fr]);
        let es = StageUnit::localized(StageName::Translation, Locale::Es);
        let fr = StageUnit::localized(StageName::Translation, Locale::Fr);

        j.begin(es);
        j.finish(
            es,
            Ok(vec![artifact(ArtifactKind::SubtitleTranslated, Some(Locale::Es))]),
        );
        j.begin(fr);
        assert_eq!(
            j.stage(StageName::Translation).unwrap().state,
            StageState::Running
        );
        j.finish(
            fr,
            Err(StageError::new(ErrorKind::TranslationFailed, "boom")),
        );

        let t = j.stage(StageName::Translation).unwrap();
        assert_eq!(t.state, StageState::Failed);
        assert_eq!(t.output_refs.len(), 1);
        let err = t.error.as_ref().unwrap();
        assert_eq!(err.kind, ErrorKind::TranslationFailed);
        assert!(err.message.contains("fr: boom"));
    }

    // ---- Dependencies ---

    #[test]
    fn dependencies_block_downstream() {
        let mut j = job(&[Locale::Es]);
        assert!(j.is_runnable(StageUnit::base(StageName::AudioExtraction)));
        assert!(!j.is_runnable(StageUnit::base(StageName::Transcription)));

        done(&mut j, StageUnit::base(StageName::AudioExtraction));
        done(&mut j, StageUnit::base(StageName::Transcription));
        let tr_es = StageUnit::localized(StageName::Translation, Locale::Es);
        assert!(!j.is_runnable(tr_es), "needs Summarization too");

        done(&mut j, StageUnit::base(StageName::Summarization));
        assert!(j.is_runnable(tr_es));
        assert!(!j.is_runnable(StageUnit::localized(
            StageName::SpeechSynthesis,
            Locale::Es
        )));
    }

    #[test]
    fn synthesis_depends_on_same_locale_translation() {
        let mut j = job(&[Locale::Es, Locale::Fr]);
        for s in [
            StageName::AudioExtraction,
            StageName::Transcription,
            StageName::Summarization,
        ] {
            done(&mut j, StageUnit::base(s));
        }
        let es = StageUnit::localized(StageName::Translation, Locale::Es);
        let fr = StageUnit::localized(StageName::Translation, Locale::Fr);
        done(&mut j, es);
        j.begin(fr);
        j.finish(fr, Err(StageError::new(ErrorKind::TranslationFailed, "x")));

        assert!(j.is_runnable(StageUnit::localized(StageName::SpeechSynthesis, Locale::Es)));
        assert!(!j.is_runnable(StageUnit::localized(StageName::SpeechSynthesis, Locale::Fr)));
    }

    #[test]
    fn stage_input_collects_dependency_outputs() {
        let mut j = job(&[Locale::It]);
        let transcription = StageUnit::base(StageName::Transcription);
        let summarization = StageUnit::base(StageName::Summarization);
        j.begin(transcription);
        j.finish(
            transcription,
            Ok(vec![artifact(ArtifactKind::Transcript, None)]),
        );
        j.begin(summarization);
        j.finish(
            summarization,
            Ok(vec![artifact(ArtifactKind::SummaryText, None)]),
        );

        let input = j.stage_input(StageUnit::localized(StageName::Translation, Locale::It));
        let kinds: Vec<_> = input.inputs.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ArtifactKind::Transcript, ArtifactKind::SummaryText]);
        assert_eq!(input.locale, Some(Locale::It));
    }

    // ---- Recovery ---

    #[test]
    fn running_units_are_recovered_as_interrupted() {
        let mut j = job(&[Locale::Es]);
        j.begin(StageUnit::base(StageName::AudioExtraction));
        j.begin(StageUnit::localized(StageName::Translation, Locale::Es));

        let recovered = j.recover_interrupted();
        assert_eq!(recovered.len(), 2);

        let a = j.stage(StageName::AudioExtraction).unwrap();
        assert_eq!(a.state, StageState::Failed);
        assert_eq!(a.error.as_ref().unwrap().kind, ErrorKind::Interrupted);
        assert_eq!(
            j.stage(StageName::Translation).unwrap().state,
            StageState::Failed
        );
        assert!(j.recover_interrupted().is_empty());
    }

    // ---- Reset / target languages ---

    #[test]
    fn reset_clears_stage_and_dependents() {
        let mut j = job(&[Locale::Es]);
        for unit in j.units() {
            done(&mut j, unit);
        }
        assert!(j.is_complete());

        j.reset(StageName::Summarization, None);
        assert_eq!(j.stage(StageName::Summarization).unwrap().state, StageState::Pending);
        assert_eq!(j.stage(StageName::Translation).unwrap().state, StageState::Pending);
        assert_eq!(j.stage(StageName::SpeechSynthesis).unwrap().state, StageState::Pending);
        assert!(j.stage(StageName::SubtitleExport).unwrap().is_done());
        assert!(j.stage(StageName::Transcription).unwrap().is_done());
    }

    #[test]
    fn reset_single_locale() {
        let mut j = job(&[Locale::Es, Locale::It]);
        for unit in j.units() {
            done(&mut j, unit);
        }
        j.reset(StageName::Translation, Some(Locale::It));

        assert!(j
            .unit(StageUnit::localized(StageName::Translation, Locale::Es))
            .unwrap()
            .is_done());
        assert_eq!(
            j.unit(StageUnit::localized(StageName::SpeechSynthesis, Locale::It))
                .unwrap()
                .state,
            StageState::Pending
        );
        assert!(j.stage(StageName::Summarization).unwrap().is_done());
    }

    #[test]
    fn adding_locales_reopens_per_locale_stages() {
        let mut j = job(&[]);
        for s in [
            StageName::AudioExtraction,
            StageName::Transcription,
            StageName::Summarization,
        ] {
            done(&mut j, StageUnit::base(s));
        }
        assert!(j.stage(StageName::Translation).unwrap().is_done());

        let added: BTreeSet<Locale> = [Locale::Es, Locale::It].into_iter().collect();
        assert!(j.add_target_languages(&added));
        assert!(!j.add_target_languages(&added));

        let t = j.stage(StageName::Translation).unwrap();
        assert_eq!(t.state, StageState::Pending);
        assert_eq!(t.locales.len(), 2);
    }

    // ---- Serde ---

    #[test]
    fn job_json_uses_stage_names_as_keys() {
        let j = job(&[Locale::Es]);
        let json = serde_json::to_value(&j).unwrap();
        assert_eq!(json["stages"]["AudioExtraction"]["state"], "pending");
        assert_eq!(
            json["stages"]["Translation"]["locales"]["es"]["state"],
            "pending"
        );
        assert!(json["stages"]["AudioExtraction"].get("error").is_none());

        let back: Job = serde_json::from_value(json).unwrap();
        assert_eq!(back, j);
    }

    #[test]
    fn snapshot_lists_current_artifacts() {
        let mut j = job(&[]);
        let unit = StageUnit::base(StageName::AudioExtraction);
        j.begin(unit);
        j.finish(unit, Ok(vec![artifact(ArtifactKind::Audio, None)]));

        let snap = JobSnapshot::from(j);
        assert_eq!(snap.artifacts.len(), 1);
        assert!(!snap.complete);
        assert_eq!(snap.state(StageName::AudioExtraction), Some(StageState::Done));
    }
}
