//! Deterministic artifact locations.

use std::path::{Path, PathBuf};

use crate::ids::{JobId, Locale};

use super::{Artifact, ArtifactError, ArtifactKind, AtomicArtifact};

/// Maps `(job_id, kind, locale?)` to a path under a root directory.
///
/// `locate` is a pure function of its inputs and the root: it never touches
/// the filesystem and never checks existence.  Stage runners use it to know
/// where to write; external readers use it to know where to fetch.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every artifact of `job_id`.
    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.root.join(job_id.as_str())
    }

    /// Canonical path of an artifact.
    ///
    /// # Errors
    ///
    /// - [`ArtifactError::LocaleRequired`] — localized kind without locale.
    /// - [`ArtifactError::LocaleNotApplicable`] — locale on a base kind.
    pub fn locate(
        &self,
        job_id: &JobId,
        kind: ArtifactKind,
        locale: Option<Locale>,
    ) -> Result<PathBuf, ArtifactError> {
        let relative = match (kind, locale) {
            (ArtifactKind::Audio, None) => PathBuf::from("audio/audio.wav"),
            (ArtifactKind::Transcript, None) => PathBuf::from("transcript/transcript.json"),
            (ArtifactKind::SubtitleSrt, None) => PathBuf::from("subtitles/base.srt"),
            (ArtifactKind::SubtitleVtt, None) => PathBuf::from("subtitles/base.vtt"),
            (ArtifactKind::SummaryText, None) => PathBuf::from("summary/summary.txt"),

            (ArtifactKind::SubtitleTranslated, Some(l)) => {
                PathBuf::from(format!("subtitles/{}.vtt", l.code()))
            }
            (ArtifactKind::SummaryTranslated, Some(l)) => {
                PathBuf::from(format!("summary/summary.{}.txt", l.code()))
            }
            (ArtifactKind::SummaryAudio, Some(l)) => {
                PathBuf::from(format!("summary/summary.{}.mp3", l.code()))
            }

            (k, None) => return Err(ArtifactError::LocaleRequired(k)),
            (k, Some(_)) => return Err(ArtifactError::LocaleNotApplicable(k)),
        };
        Ok(self.job_dir(job_id).join(relative))
    }

    /// [`locate`](Self::locate) wrapped into an [`Artifact`] reference.
    pub fn artifact(
        &self,
        job_id: &JobId,
        kind: ArtifactKind,
        locale: Option<Locale>,
    ) -> Result<Artifact, ArtifactError> {
        Ok(Artifact {
            kind,
            locale,
            path: self.locate(job_id, kind, locale)?,
        })
    }

    /// Open a scoped writer for an artifact.  Nothing appears at the
    /// canonical path until the writer is committed.
    pub fn create(
        &self,
        job_id: &JobId,
        kind: ArtifactKind,
        locale: Option<Locale>,
    ) -> Result<AtomicArtifact, ArtifactError> {
        AtomicArtifact::create(self.artifact(job_id, kind, locale)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ArtifactStore {
        ArtifactStore::new("/data/artifacts")
    }

    fn job() -> JobId {
        "J1".parse().unwrap()
    }

    #[test]
    fn locate_is_deterministic() {
        let s = store();
        for kind in ArtifactKind::ALL {
            let locale = kind.is_localized().then_some(Locale::Es);
            let a = s.locate(&job(), kind, locale).unwrap();
            let b = s.locate(&job(), kind, locale).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn locate_partitions_by_job() {
        let s = store();
        let other: JobId = "J2".parse().unwrap();
        let a = s.locate(&job(), ArtifactKind::Audio, None).unwrap();
        let b = s.locate(&other, ArtifactKind::Audio, None).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("/data/artifacts/J1"));
    }

    #[test]
    fn locate_layout() {
        let s = store();
        let p = |k, l| s.locate(&job(), k, l).unwrap();
        assert_eq!(
            p(ArtifactKind::SubtitleSrt, None),
            PathBuf::from("/data/artifacts/J1/subtitles/base.srt")
        );
        assert_eq!(
            p(ArtifactKind::SubtitleTranslated, Some(Locale::It)),
            PathBuf::from("/data/artifacts/J1/subtitles/it.vtt")
        );
        assert_eq!(
            p(ArtifactKind::SummaryAudio, Some(Locale::Fr)),
            PathBuf::from("/data/artifacts/J1/summary/summary.fr.mp3")
        );
        assert_eq!(
            p(ArtifactKind::SummaryTranslated, Some(Locale::Pt)),
            PathBuf::from("/data/artifacts/J1/summary/summary.pt.txt")
        );
    }

    #[test]
    fn locale_paths_are_distinct() {
        let s = store();
        let es = s
            .locate(&job(), ArtifactKind::SubtitleTranslated, Some(Locale::Es))
            .unwrap();
        let it = s
            .locate(&job(), ArtifactKind::SubtitleTranslated, Some(Locale::It))
            .unwrap();
        assert_ne!(es, it);
    }

    #[test]
    fn locale_mismatch_is_rejected() {
        let s = store();
        assert!(matches!(
            s.locate(&job(), ArtifactKind::SummaryAudio, None),
            Err(ArtifactError::LocaleRequired(ArtifactKind::SummaryAudio))
        ));
        assert!(matches!(
            s.locate(&job(), ArtifactKind::Audio, Some(Locale::En)),
            Err(ArtifactError::LocaleNotApplicable(ArtifactKind::Audio))
        ));
    }

    #[test]
    fn locate_does_not_touch_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let s = ArtifactStore::new(dir.path().join("artifacts"));
        let _ = s.locate(&job(), ArtifactKind::Transcript, None).unwrap();
        assert!(!dir.path().join("artifacts").exists());
    }
}
