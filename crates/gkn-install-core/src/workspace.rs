//! Per-run scratch directory for downloads and extraction.
//!
//! Each run gets its own uniquely named directory under the system temp dir,
//! so concurrent installers never collide. Dropping the workspace removes it;
//! [`ScratchWorkspace::close`] does the same but logs a failed teardown.

use std::path::{Path, PathBuf};

use crate::artifact::MANIFEST_FILENAME;
use crate::error::InstallError;

/// Prefix of scratch directory names.
pub const SCRATCH_PREFIX: &str = "gkn-install-";

const EXTRACT_DIR: &str = "extract";

/// Exclusive staging area for one install run.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: tempfile::TempDir,
}

impl ScratchWorkspace {
    /// Create a fresh workspace in the system temp directory.
    pub fn create() -> Result<Self, InstallError> {
        Self::create_in(&std::env::temp_dir())
    }

    /// Create a fresh workspace under `parent`.
    pub fn create_in(parent: &Path) -> Result<Self, InstallError> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| InstallError::fs("create scratch directory", parent, e))?;
        tracing::debug!(path = %dir.path().display(), "scratch workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join(MANIFEST_FILENAME)
    }

    pub fn archive_path(&self, artifact_file_name: &str) -> PathBuf {
        self.dir.path().join(artifact_file_name)
    }

    /// Extraction output; created empty by [`ScratchWorkspace::fresh_extract_dir`].
    pub fn extract_dir(&self) -> PathBuf {
        self.dir.path().join(EXTRACT_DIR)
    }

    /// (Re)create an empty extraction directory and return its path.
    pub fn fresh_extract_dir(&self) -> Result<PathBuf, InstallError> {
        let dir = self.extract_dir();
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .map_err(|e| InstallError::fs("remove directory", &dir, e))?;
        }
        std::fs::create_dir_all(&dir).map_err(|e| InstallError::fs("create directory", &dir, e))?;
        Ok(dir)
    }

    /// Remove the workspace. Failure is logged, not returned.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(path = %path.display(), "failed to remove scratch workspace: {}", e);
        }
    }
}
