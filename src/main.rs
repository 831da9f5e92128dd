//! `videoconv` command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Parse arguments.
//! 2. Initialise logging (`RUST_LOG`, default `info`).
//! 3. Load [`AppConfig`] (defaults on first run), apply `--data-dir`.
//! 4. Create the [`tokio`] runtime and build the [`Orchestrator`].
//! 5. Run the subcommand and print its result as JSON on stdout.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use videoconv::artifact::ArtifactKind;
use videoconv::config::AppConfig;
use videoconv::ids::{JobId, Locale};
use videoconv::pipeline::{AdvanceOptions, Orchestrator, StageName, UploadRequest};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "videoconv", version, about = "Resumable video processing pipeline")]
struct Cli {
    /// settings.toml to use instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root for job state, videos and artifacts.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a video and create its job.
    Upload {
        video: PathBuf,
        /// Target locale (repeatable): es, en, pt, it, fr.
        #[arg(long = "lang", value_name = "LOCALE")]
        languages: Vec<Locale>,
        /// Spoken-language hint; omit to auto-detect.
        #[arg(long)]
        source_language: Option<String>,
        /// Advance the new job immediately.
        #[arg(long)]
        advance: bool,
    },

    /// Run every stage that is ready.
    Advance {
        job_id: JobId,
        /// Locale to add to the job (repeatable).
        #[arg(long = "lang", value_name = "LOCALE")]
        languages: Vec<Locale>,
        /// Per-stage timeout in seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Print a job snapshot, or every job id when none is given.
    Status { job_id: Option<JobId> },

    /// Reset a stage and its dependents to pending.
    Rerun {
        job_id: JobId,
        stage: StageName,
        /// Only this locale of a per-locale stage.
        #[arg(long)]
        locale: Option<Locale>,
    },

    /// Correct the spoken language and redo transcription onwards.
    SetLanguage {
        job_id: JobId,
        /// Language code, or "auto" to detect it.
        language: String,
    },

    /// Print the canonical path of an artifact.
    Locate {
        job_id: JobId,
        kind: ArtifactKind,
        #[arg(long)]
        locale: Option<Locale>,
    },
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Created<'a> {
    job_id: &'a JobId,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, orchestrator: Orchestrator) -> Result<()> {
    match command {
        Command::Upload {
            video,
            languages,
            source_language,
            advance,
        } => {
            let job_id = orchestrator
                .create_job(UploadRequest {
                    video,
                    target_languages: languages.into_iter().collect(),
                    source_language,
                })
                .await?;
            if advance {
                print_json(&orchestrator.advance(&job_id).await?)
            } else {
                print_json(&Created { job_id: &job_id })
            }
        }

        Command::Advance {
            job_id,
            languages,
            timeout,
        } => {
            let options = AdvanceOptions {
                target_languages: languages.into_iter().collect::<BTreeSet<_>>(),
                stage_timeout: timeout.map(Duration::from_secs),
            };
            print_json(&orchestrator.advance_with(&job_id, options).await?)
        }

        Command::Status { job_id: Some(id) } => print_json(&orchestrator.snapshot(&id)?),
        Command::Status { job_id: None } => print_json(&orchestrator.list_jobs()?),

        Command::Rerun {
            job_id,
            stage,
            locale,
        } => print_json(&orchestrator.rerun(&job_id, stage, locale).await?),

        Command::SetLanguage { job_id, language } => print_json(
            &orchestrator
                .set_source_language(&job_id, Some(language))
                .await?,
        ),

        Command::Locate {
            job_id,
            kind,
            locale,
        } => {
            let path = orchestrator.artifacts().locate(&job_id, kind, locale)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    log::debug!("data dir: {}", config.data_dir().display());

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(async {
        let orchestrator = Orchestrator::from_config(&config)?;
        run(cli.command, orchestrator).await
    })
}
