//! Pipeline orchestrator: drives a job through its stages.
//!
//! [`Orchestrator`] owns the job-state store and the stage runners.  Every
//! request goes through the same loop:
//!
//! ```text
//! advance(job_id)
//!   └─▶ lock job (in process + <id>.lock) ─▶ load state ─▶ running → failed{Interrupted}
//!         └─▶ for stage in dependency order
//!               ├─ done / deps not done      → skip
//!               └─ runnable
//!                    ├─ mark running, persist
//!                    ├─ runner.run(input)  (bounded by stage timeout)
//!                    └─ mark done | failed, persist
//!         └─▶ JobSnapshot
//! ```
//!
//! Per-locale stages (Translation, SpeechSynthesis) fan out with
//! `buffer_unordered`, and the state is persisted as each locale finishes.
//! Runners never execute while the state is being written.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::artifact::{Artifact, ArtifactStore};
use crate::config::{AppConfig, DataLayout, PipelineConfig};
use crate::ids::{JobId, Locale};

use super::error::{ErrorKind, PipelineError, StageError, StoreError};
use super::lock::{JobGuard, JobLocks};
use super::stage::{StageInput, StageRunners};
use super::state::{Job, JobSnapshot, StageName, StageUnit};
use super::store::JobStore;

/// Accepted upload extensions (lowercase).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "webm", "avi", "m4v", "mpeg", "mpg"];

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A new upload.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Path of the uploaded file; it is copied into the video directory.
    pub video: PathBuf,
    pub target_languages: BTreeSet<Locale>,
    /// Spoken-language hint; `None` or empty = auto-detect.
    pub source_language: Option<String>,
}

/// Per-call knobs for [`Orchestrator::advance_with`].
#[derive(Debug, Clone, Default)]
pub struct AdvanceOptions {
    /// Locales to add to the job.  Existing locales are kept.
    pub target_languages: BTreeSet<Locale>,
    /// Bound for each runner invocation; `None` = configured default.
    pub stage_timeout: Option<Duration>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Sequences stages, persists job state and isolates stage failures.
///
/// Requests that change a job hold its lock for their whole duration: an
/// async mutex for callers sharing this instance and an exclusive file lock
/// on `<state_dir>/<job_id>.lock` for orchestrators in other processes.
pub struct Orchestrator {
    layout: DataLayout,
    jobs: JobStore,
    artifacts: ArtifactStore,
    runners: StageRunners,
    stage_timeout: Duration,
    locale_concurrency: usize,
    locks: JobLocks,
}

impl Orchestrator {
    pub fn new(layout: DataLayout, runners: StageRunners, config: &PipelineConfig) -> Self {
        Self {
            jobs: JobStore::new(&layout.state_dir),
            locks: JobLocks::new(&layout.state_dir),
            artifacts: ArtifactStore::new(&layout.artifacts_dir),
            layout,
            runners,
            stage_timeout: config.stage_timeout(),
            locale_concurrency: config.locale_concurrency.max(1),
        }
    }

    /// Build the orchestrator with the capability providers selected in
    /// `config`.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let layout = DataLayout::new(&config.data_dir());
        let runners =
            super::stages::runners_from_config(config, ArtifactStore::new(&layout.artifacts_dir))?;
        Ok(Self::new(layout, runners, &config.pipeline))
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    // -----------------------------------------------------------------------
    // Upload boundary
    // -----------------------------------------------------------------------

    /// Validate and store an upload, then create its job with every stage
    /// `pending`.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidInput`] — missing file or unsupported
    ///   extension.
    /// - [`PipelineError::Storage`] — the copy or the state file failed.
    pub async fn create_job(&self, request: UploadRequest) -> Result<JobId, PipelineError> {
        let ext = video_extension(&request.video)?;
        let job_id = JobId::generate();
        let dest = self.layout.videos_dir.join(format!("{job_id}.{ext}"));

        let source = request.video.clone();
        let target = dest.clone();
        tokio::task::spawn_blocking(move || store_video(&source, &target))
            .await
            .map_err(|e| StoreError::io(&dest, std::io::Error::other(e)))??;

        let source_language = normalize_language(request.source_language);

        let job = Job::new(
            job_id.clone(),
            dest,
            source_language,
            request.target_languages,
        );
        self.jobs.create(&job)?;

        log::info!(
            "job {job_id}: created from {} (targets: {})",
            request.video.display(),
            locale_list(&job.target_languages)
        );
        Ok(job_id)
    }

    // -----------------------------------------------------------------------
    // Status boundary
    // -----------------------------------------------------------------------

    /// Current state of a job.  Read-only: nothing is run or persisted.
    pub fn snapshot(&self, job_id: &JobId) -> Result<JobSnapshot, PipelineError> {
        Ok(JobSnapshot::from(self.jobs.load(job_id)?))
    }

    /// Every known job id.
    pub fn list_jobs(&self) -> Result<Vec<JobId>, PipelineError> {
        Ok(self.jobs.list()?)
    }

    /// [`advance_with`](Self::advance_with) with default options.
    pub async fn advance(&self, job_id: &JobId) -> Result<JobSnapshot, PipelineError> {
        self.advance_with(job_id, AdvanceOptions::default()).await
    }

    /// Run every stage whose dependencies are `done` and which is not `done`
    /// itself, once, in dependency order.
    ///
    /// Stage failures are recorded in the returned snapshot; only an unknown
    /// job or a failure to read/persist the job state is returned as `Err`.
    /// On a fully `done` job nothing is run and nothing is written.
    pub async fn advance_with(
        &self,
        job_id: &JobId,
        options: AdvanceOptions,
    ) -> Result<JobSnapshot, PipelineError> {
        let _guard = self.lock_job(job_id).await?;

        let mut job = self.jobs.load(job_id)?;
        let mut dirty = false;

        let recovered = job.recover_interrupted();
        if !recovered.is_empty() {
            let units: Vec<String> = recovered.iter().map(ToString::to_string).collect();
            log::warn!("job {job_id}: interrupted stages found: {}", units.join(", "));
            dirty = true;
        }
        if job.add_target_languages(&options.target_languages) {
            log::info!(
                "job {job_id}: target languages now {}",
                locale_list(&job.target_languages)
            );
            dirty = true;
        }
        if dirty {
            self.persist(&mut job)?;
        }

        let timeout = options.stage_timeout.unwrap_or(self.stage_timeout);
        for stage in StageName::ALL {
            if stage.is_per_locale() {
                self.run_locales(&mut job, stage, timeout).await?;
            } else {
                let unit = StageUnit::base(stage);
                if job.is_runnable(unit) {
                    self.run_unit(&mut job, unit, timeout).await?;
                }
            }
        }

        Ok(JobSnapshot::from(job))
    }

    /// Reset `stage` and everything downstream of it to `pending`, so the
    /// next [`advance`](Self::advance) regenerates their artifacts.
    ///
    /// With a `locale`, only that locale of the per-locale stages is reset.
    pub async fn rerun(
        &self,
        job_id: &JobId,
        stage: StageName,
        locale: Option<Locale>,
    ) -> Result<JobSnapshot, PipelineError> {
        let _guard = self.lock_job(job_id).await?;

        let mut job = self.jobs.load(job_id)?;
        if let Some(l) = locale {
            if !stage.is_per_locale() {
                return Err(PipelineError::InvalidInput(format!(
                    "stage {stage} does not run per locale"
                )));
            }
            if !job.target_languages.contains(&l) {
                return Err(PipelineError::InvalidInput(format!(
                    "locale {l} is not requested for job {job_id}"
                )));
            }
        }

        job.recover_interrupted();
        job.reset(stage, locale);
        self.persist(&mut job)?;

        match locale {
            Some(l) => log::info!("job {job_id}: {stage}[{l}] reset for rerun"),
            None => log::info!("job {job_id}: {stage} and dependents reset for rerun"),
        }
        Ok(JobSnapshot::from(job))
    }

    /// Correct the spoken-language hint of an existing job.
    ///
    /// A changed hint resets Transcription and everything downstream, so the
    /// next [`advance`](Self::advance) supersedes the transcript.  Setting the
    /// current value again changes nothing.
    pub async fn set_source_language(
        &self,
        job_id: &JobId,
        source_language: Option<String>,
    ) -> Result<JobSnapshot, PipelineError> {
        let _guard = self.lock_job(job_id).await?;

        let mut job = self.jobs.load(job_id)?;
        let source_language = normalize_language(source_language);
        if job.source_language == source_language {
            return Ok(JobSnapshot::from(job));
        }

        job.recover_interrupted();
        job.source_language = source_language;
        job.reset(StageName::Transcription, None);
        self.persist(&mut job)?;

        log::info!(
            "job {job_id}: source language set to {}, transcription reset",
            job.source_language.as_deref().unwrap_or("auto")
        );
        Ok(JobSnapshot::from(job))
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    async fn run_unit(
        &self,
        job: &mut Job,
        unit: StageUnit,
        timeout: Duration,
    ) -> Result<(), PipelineError> {
        let input = job.stage_input(unit);
        job.begin(unit);
        self.persist(job)?;
        log::info!("job {}: {unit} running", job.job_id);

        let outcome = self.invoke(unit, &input, timeout).await;
        self.record(job, unit, outcome)
    }

    /// Run every runnable locale of `stage`, at most `locale_concurrency` at
    /// a time.
    async fn run_locales(
        &self,
        job: &mut Job,
        stage: StageName,
        timeout: Duration,
    ) -> Result<(), PipelineError> {
        let units: Vec<StageUnit> = job
            .target_languages
            .iter()
            .map(|l| StageUnit::localized(stage, *l))
            .filter(|u| job.is_runnable(*u))
            .collect();
        if units.is_empty() {
            return Ok(());
        }

        // Queued locales are recorded as running too, so a crash leaves all
        // of them to be recovered on the next load.
        let mut prepared = Vec::with_capacity(units.len());
        for unit in units {
            prepared.push((unit, job.stage_input(unit)));
            job.begin(unit);
        }
        self.persist(job)?;
        log::info!(
            "job {}: {stage} running for {} locale(s)",
            job.job_id,
            prepared.len()
        );

        let mut finished = stream::iter(prepared)
            .map(|(unit, input)| async move {
                let outcome = self.invoke(unit, &input, timeout).await;
                (unit, outcome)
            })
            .buffer_unordered(self.locale_concurrency);

        while let Some((unit, outcome)) = finished.next().await {
            self.record(job, unit, outcome)?;
        }
        Ok(())
    }

    async fn invoke(
        &self,
        unit: StageUnit,
        input: &StageInput,
        timeout: Duration,
    ) -> Result<Vec<Artifact>, StageError> {
        let runner = self.runners.get(unit.stage);
        match tokio::time::timeout(timeout, runner.run(input)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StageError::new(
                ErrorKind::Timeout,
                format!("{unit} did not finish within {:.1}s", timeout.as_secs_f64()),
            )),
        }
    }

    fn record(
        &self,
        job: &mut Job,
        unit: StageUnit,
        outcome: Result<Vec<Artifact>, StageError>,
    ) -> Result<(), PipelineError> {
        match &outcome {
            Ok(outputs) => log::info!(
                "job {}: {unit} done ({} artifact(s))",
                job.job_id,
                outputs.len()
            ),
            Err(e) => log::warn!("job {}: {unit} failed: {e}", job.job_id),
        }
        job.finish(unit, outcome);
        self.persist(job)
    }

    fn persist(&self, job: &mut Job) -> Result<(), PipelineError> {
        job.touch();
        self.jobs.save(job).map_err(|e| {
            log::error!("job {}: failed to persist state: {e}", job.job_id);
            PipelineError::Storage(e)
        })
    }

    /// Unknown jobs are rejected before a lock file is created for them.
    async fn lock_job(&self, job_id: &JobId) -> Result<JobGuard<'_>, PipelineError> {
        if !self.jobs.exists(job_id) {
            return Err(PipelineError::JobNotFound(job_id.clone()));
        }
        Ok(self.locks.acquire(job_id).await?)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lowercase extension of an acceptable upload.
fn video_extension(video: &Path) -> Result<String, PipelineError> {
    if !video.is_file() {
        return Err(PipelineError::InvalidInput(format!(
            "video not found: {}",
            video.display()
        )));
    }
    let ext = video
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(PipelineError::InvalidInput(format!(
            "unsupported video format {:?} (accepted: {})",
            ext,
            VIDEO_EXTENSIONS.join(", ")
        )))
    }
}

/// `None`, empty and `"auto"` all mean auto-detect.
fn normalize_language(language: Option<String>) -> Option<String> {
    language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("auto"))
}

/// Copy the upload to `dest` without ever replacing an existing file.
fn store_video(source: &Path, dest: &Path) -> Result<(), StoreError> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let temp = tempfile::Builder::new()
        .prefix(".upload-")
        .tempfile_in(dir)
        .map_err(|e| StoreError::io(dir, e))?;
    std::fs::copy(source, temp.path()).map_err(|e| StoreError::io(source, e))?;
    temp.persist_noclobber(dest)
        .map_err(|e| StoreError::io(dest, e.error))?;
    log::debug!("upload stored at {}", dest.display());
    Ok(())
}

fn locale_list(locales: &BTreeSet<Locale>) -> String {
    if locales.is_empty() {
        return "none".into();
    }
    locales
        .iter()
        .map(|l| l.code())
        .collect::<Vec<_>>()
        .join(",")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
