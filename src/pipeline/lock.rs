//! Per-job exclusion.
//!
//! A job is held through two layers:
//!
//! ```text
//! JobLocks::acquire(job_id)
//!   ├─ in-process async mutex     (tasks of one orchestrator queue here)
//!   └─ flock <state_dir>/<id>.lock (orchestrators in other processes)
//! ```
//!
//! The lock file is never removed; only the lock on it comes and goes.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use fs2::FileExt;
use tokio::sync::OwnedMutexGuard;

use crate::ids::JobId;

use super::error::StoreError;

type LocalLock = Arc<tokio::sync::Mutex<()>>;

/// Lock table for the jobs under one state directory.
#[derive(Debug)]
pub(crate) struct JobLocks {
    dir: PathBuf,
    local: Mutex<HashMap<JobId, LocalLock>>,
}

impl JobLocks {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            local: Mutex::new(HashMap::new()),
        }
    }

    pub fn path(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(format!("{job_id}.lock"))
    }

    /// Wait until this task holds `job_id` exclusively, in this process and
    /// on disk.
    pub async fn acquire(&self, job_id: &JobId) -> Result<JobGuard<'_>, StoreError> {
        let local = {
            let mut table = self.local.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(job_id.clone()).or_default())
        };

        // Constructed before the file lock so a failure below still prunes
        // the table entry on drop.
        let mut guard = JobGuard {
            locks: self,
            job_id: job_id.clone(),
            file: None,
            local: Some(local.lock_owned().await),
        };

        let path = self.path(job_id);
        let target = path.clone();
        let file = tokio::task::spawn_blocking(move || lock_file(&target))
            .await
            .map_err(|e| StoreError::io(&path, std::io::Error::other(e)))??;
        log::debug!("job {job_id}: lock acquired ({})", path.display());

        guard.file = Some(file);
        Ok(guard)
    }

    fn release(&self, job_id: &JobId) {
        let mut table = self.local.lock().unwrap_or_else(PoisonError::into_inner);
        if table.get(job_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            table.remove(job_id);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.local
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Blocks until the exclusive lock on `path` is held.
fn lock_file(path: &Path) -> Result<File, StoreError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;
    file.lock_exclusive().map_err(|e| StoreError::io(path, e))?;
    Ok(file)
}

/// Held for the duration of one request on a job.
pub(crate) struct JobGuard<'a> {
    locks: &'a JobLocks,
    job_id: JobId,
    file: Option<File>,
    local: Option<OwnedMutexGuard<()>>,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = FileExt::unlock(&file) {
                log::warn!("job {}: failed to release lock: {e}", self.job_id);
            }
        }
        drop(self.local.take());
        self.locks.release(&self.job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn id(s: &str) -> JobId {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn released_jobs_leave_the_table() {
        let dir = tempdir().unwrap();
        let locks = JobLocks::new(dir.path());

        let a = locks.acquire(&id("J1")).await.unwrap();
        let b = locks.acquire(&id("J2")).await.unwrap();
        assert_eq!(locks.tracked(), 2);
        assert!(locks.path(&id("J1")).is_file());

        drop(a);
        assert_eq!(locks.tracked(), 1);
        drop(b);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn waiter_keeps_the_entry_alive() {
        let dir = tempdir().unwrap();
        let locks = JobLocks::new(dir.path());
        let job = id("J1");

        let first = locks.acquire(&job).await.unwrap();
        let second = locks.acquire(&job);
        tokio::pin!(second);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), &mut second)
                .await
                .is_err()
        );
        drop(first);
        assert_eq!(locks.tracked(), 1);

        let second = second.await.unwrap();
        drop(second);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn separate_tables_exclude_each_other_on_disk() {
        let dir = tempdir().unwrap();
        let one = JobLocks::new(dir.path());
        let other = JobLocks::new(dir.path());
        let job = id("J1");

        let held = one.acquire(&job).await.unwrap();
        let waiting = other.acquire(&job);
        tokio::pin!(waiting);
        assert!(
            tokio::time::timeout(Duration::from_millis(100), &mut waiting)
                .await
                .is_err()
        );

        drop(held);
        let acquired = tokio::time::timeout(Duration::from_secs(5), waiting).await;
        assert!(acquired.unwrap().is_ok());
    }

    #[tokio::test]
    async fn other_jobs_are_not_blocked() {
        let dir = tempdir().unwrap();
        let locks = JobLocks::new(dir.path());

        let _held = locks.acquire(&id("J1")).await.unwrap();
        let other = tokio::time::timeout(Duration::from_secs(5), locks.acquire(&id("J2"))).await;
        assert!(other.unwrap().is_ok());
    }
}
