//! Error kinds and the two error types of the pipeline boundary.
//!
//! * [`StageError`] — a captured stage failure.  Stored in the job record,
//!   never returned from [`Orchestrator::advance`](super::Orchestrator::advance).
//! * [`PipelineError`] — request-fatal conditions: unknown job, bad upload,
//!   or a job-state persistence failure.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::JobId;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Stable, serializable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    JobNotFound,
    /// Unsupported video format, missing file, or a malformed stage input.
    InvalidInput,
    ExtractionFailed,
    TranscriptionFailed,
    SummarizationFailed,
    TranslationFailed,
    SynthesisFailed,
    Timeout,
    StorageFailure,
    /// The stage was `running` when the process stopped.  Retryable.
    Interrupted,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::JobNotFound => "JobNotFound",
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::ExtractionFailed => "ExtractionFailed",
            ErrorKind::TranscriptionFailed => "TranscriptionFailed",
            ErrorKind::SummarizationFailed => "SummarizationFailed",
            ErrorKind::TranslationFailed => "TranslationFailed",
            ErrorKind::SynthesisFailed => "SynthesisFailed",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::StorageFailure => "StorageFailure",
            ErrorKind::Interrupted => "Interrupted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// StageError
// ---------------------------------------------------------------------------

/// A stage failure as recorded in `StageStatus.error`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct StageError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn storage(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::StorageFailure, message.to_string())
    }
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failures of the job-state store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no state file for job {0}")]
    NotFound(JobId),

    #[error("job {0} already exists")]
    AlreadyExists(JobId),

    #[error("job state I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt job state at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialise job state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that end a request at the orchestrator boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Job state could not be read or persisted.  The in-memory attempt has
    /// been discarded.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::JobNotFound(_) => ErrorKind::JobNotFound,
            PipelineError::InvalidInput(_) => ErrorKind::InvalidInput,
            PipelineError::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => PipelineError::JobNotFound(id),
            other => PipelineError::Storage(other),
        }
    }
}
