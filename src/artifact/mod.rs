//! Artifact naming and atomic artifact writes.
//!
//! * [`ArtifactStore`] — pure `(job_id, kind, locale?) → path` mapping.
//! * [`AtomicArtifact`] — a temporary file beside the canonical path that is
//!   renamed into place on [`commit`](AtomicArtifact::commit) and deleted
//!   otherwise, so no half-written file is ever visible under a canonical
//!   name.
//!
//! # Layout
//!
//! ```text
//! <artifacts>/<job_id>/
//!   audio/audio.wav
//!   transcript/transcript.json
//!   subtitles/base.srt
//!   subtitles/base.vtt
//!   subtitles/<locale>.vtt
//!   summary/summary.txt
//!   summary/summary.<locale>.txt
//!   summary/summary.<locale>.mp3
//! ```

pub mod atomic;
pub mod store;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::Locale;

pub use atomic::AtomicArtifact;
pub use store::ArtifactStore;

// ---------------------------------------------------------------------------
// ArtifactError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArtifactError {
    /// A localized kind was requested without a locale.
    #[error("artifact kind {0} requires a locale")]
    LocaleRequired(ArtifactKind),

    /// A locale was supplied for a kind that is not localized.
    #[error("artifact kind {0} does not take a locale")]
    LocaleNotApplicable(ArtifactKind),

    #[error("artifact I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// Every kind of file a stage can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Audio,
    Transcript,
    SubtitleSrt,
    SubtitleVtt,
    SummaryText,
    SummaryTranslated,
    SummaryAudio,
    SubtitleTranslated,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 8] = [
        ArtifactKind::Audio,
        ArtifactKind::Transcript,
        ArtifactKind::SubtitleSrt,
        ArtifactKind::SubtitleVtt,
        ArtifactKind::SummaryText,
        ArtifactKind::SummaryTranslated,
        ArtifactKind::SummaryAudio,
        ArtifactKind::SubtitleTranslated,
    ];

    /// `true` for kinds addressed by `(job_id, kind, locale)`.
    pub fn is_localized(self) -> bool {
        matches!(
            self,
            ArtifactKind::SummaryTranslated
                | ArtifactKind::SummaryAudio
                | ArtifactKind::SubtitleTranslated
        )
    }

    /// Stable snake_case name, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Audio => "audio",
            ArtifactKind::Transcript => "transcript",
            ArtifactKind::SubtitleSrt => "subtitle_srt",
            ArtifactKind::SubtitleVtt => "subtitle_vtt",
            ArtifactKind::SummaryText => "summary_text",
            ArtifactKind::SummaryTranslated => "summary_translated",
            ArtifactKind::SummaryAudio => "summary_audio",
            ArtifactKind::SubtitleTranslated => "subtitle_translated",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.label() == s)
            .ok_or_else(|| format!("unknown artifact kind: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// Reference to a durable output file of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_kinds() {
        let localized: Vec<_> = ArtifactKind::ALL
            .into_iter()
            .filter(|k| k.is_localized())
            .collect();
        assert_eq!(
            localized,
            vec![
                ArtifactKind::SummaryTranslated,
                ArtifactKind::SummaryAudio,
                ArtifactKind::SubtitleTranslated
            ]
        );
    }

    #[test]
    fn label_matches_serde_name() {
        for kind in ArtifactKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.label()));
            assert_eq!(kind.label().parse::<ArtifactKind>().unwrap(), kind);
        }
    }
}
