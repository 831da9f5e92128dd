//! Durable job-state persistence: one pretty JSON document per job.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::ids::JobId;

use super::error::StoreError;
use super::state::Job;

/// Reads and writes `<state_dir>/<job_id>.json`.
///
/// Writes go through a temp file in the same directory followed by a rename,
/// so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(format!("{job_id}.json"))
    }

    pub fn exists(&self, job_id: &JobId) -> bool {
        self.path(job_id).is_file()
    }

    /// Persist a brand-new job.  Fails with [`StoreError::AlreadyExists`]
    /// instead of replacing an existing document.
    pub fn create(&self, job: &Job) -> Result<(), StoreError> {
        let path = self.path(&job.job_id);
        let temp = self.write_temp(job)?;
        temp.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                StoreError::AlreadyExists(job.job_id.clone())
            } else {
                StoreError::io(&path, e.error)
            }
        })?;
        log::debug!("job state created: {}", path.display());
        Ok(())
    }

    /// Atomically replace the stored document of `job`.
    pub fn save(&self, job: &Job) -> Result<(), StoreError> {
        let path = self.path(&job.job_id);
        let temp = self.write_temp(job)?;
        temp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;
        Ok(())
    }

    /// Load a job, inserting any missing stage or locale entry as `pending`.
    pub fn load(&self, job_id: &JobId) -> Result<Job, StoreError> {
        let path = self.path(job_id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(job_id.clone()))
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        let mut job: Job =
            serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
        job.ensure_complete();
        Ok(job)
    }

    /// Every job id with a state document, sorted.
    pub fn list(&self) -> Result<Vec<JobId>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut ids: Vec<JobId> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem()?.to_str()?.parse().ok())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn write_temp(&self, job: &Job) -> Result<NamedTempFile, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let json = serde_json::to_vec_pretty(job)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".state-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| StoreError::io(&self.dir, e))?;
        temp.write_all(&json)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::io(temp.path().to_path_buf(), e))?;
        Ok(temp)
    }
}
