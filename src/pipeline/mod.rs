//! Pipeline orchestration for uploaded videos.
//!
//! This module sequences the stages that turn an upload into its derived
//! artifacts, persists each job's progress so work can be resumed across
//! independent requests, and isolates the failure of any one stage.
//!
//! # Architecture
//!
//! ```text
//! create_job(UploadRequest) ──▶ videos/<id>.<ext> + state/<id>.json
//!
//! advance(job_id)
//!        │
//!        ▼
//! Orchestrator ── per-job lock ── JobStore (state/<id>.json)
//!        │
//!        ├─ AudioExtraction   → audio.wav
//!        ├─ Transcription     → transcript.json
//!        ├─ SubtitleExport    → base.srt, base.vtt
//!        ├─ Summarization     → summary.txt
//!        ├─ Translation(l)    → <l>.vtt, summary.<l>.txt
//!        └─ SpeechSynthesis(l)→ summary.<l>.mp3
//!        │
//!        ▼
//! JobSnapshot (job record + current artifacts)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use videoconv::config::AppConfig;
//! use videoconv::pipeline::{Orchestrator, UploadRequest};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::load()?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//!
//! let job_id = orchestrator
//!     .create_job(UploadRequest {
//!         video: "talk.mp4".into(),
//!         target_languages: ["es".parse()?].into_iter().collect(),
//!         source_language: None,
//!     })
//!     .await?;
//!
//! let snapshot = orchestrator.advance(&job_id).await?;
//! println!("{}", serde_json::to_string_pretty(&snapshot)?);
//! # Ok(())
//! # }
//! ```

pub mod error;
mod lock;
pub mod runner;
pub mod stage;
pub mod stages;
pub mod state;
pub mod store;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use error::{ErrorKind, PipelineError, StageError, StoreError};
pub use runner::{AdvanceOptions, Orchestrator, UploadRequest, VIDEO_EXTENSIONS};
pub use stage::{StageInput, StageRunner, StageRunners};
pub use state::{Job, JobSnapshot, StageName, StageState, StageStatus, StageUnit};
pub use stages::{runners_from_config, Capabilities};
pub use store::JobStore;
