//! videoconv: resumable video-to-derivatives pipeline.
//!
//! An uploaded video becomes a job.  Each call to
//! [`Orchestrator::advance`](pipeline::Orchestrator::advance) runs whatever
//! stages are ready (audio extraction, transcription, subtitles, summary,
//! per-locale translation and speech) and persists the job's progress, so
//! work continues across independent requests and process restarts.

pub mod artifact;
pub mod config;
pub mod ids;
pub mod llm;
pub mod media;
pub mod pipeline;
pub mod stt;
pub mod subtitles;
pub mod summary;
pub mod tts;
