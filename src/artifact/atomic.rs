//! Scoped artifact writer with atomic rename on success.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::{Artifact, ArtifactError};

/// A pending artifact.
///
/// Holds a temporary file in the same directory as the canonical path, so
/// the final rename never crosses a filesystem.  In-process writers use
/// [`write_all`](Self::write_all); external tools are handed
/// [`path`](Self::path) and write there themselves (the temp name keeps
/// the canonical extension so tools like ffmpeg pick the right format).
///
/// Dropping an `AtomicArtifact` without committing deletes the temp file.
#[derive(Debug)]
pub struct AtomicArtifact {
    artifact: Artifact,
    temp: NamedTempFile,
}

impl AtomicArtifact {
    /// Create the parent directory and an empty temp file beside `artifact.path`.
    pub fn create(artifact: Artifact) -> Result<Self, ArtifactError> {
        let dir = artifact
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| ".".into());
        std::fs::create_dir_all(&dir).map_err(|e| ArtifactError::io(&dir, e))?;

        let suffix = artifact
            .path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let temp = tempfile::Builder::new()
            .prefix(".partial-")
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(|e| ArtifactError::io(&dir, e))?;

        Ok(Self { artifact, temp })
    }

    /// Where the content is being written before commit.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// The reference this writer will produce.
    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), ArtifactError> {
        let path = self.temp.path().to_path_buf();
        self.temp
            .write_all(bytes)
            .and_then(|()| self.temp.flush())
            .map_err(|e| ArtifactError::io(path, e))
    }

    /// Atomically move the content onto the canonical path, superseding any
    /// previous artifact there.
    pub fn commit(self) -> Result<Artifact, ArtifactError> {
        let Self { artifact, temp } = self;
        temp.persist(&artifact.path)
            .map_err(|e| ArtifactError::io(&artifact.path, e.error))?;
        log::debug!("artifact committed: {}", artifact.path.display());
        Ok(artifact)
    }
}
