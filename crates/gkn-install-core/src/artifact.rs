//! Artifact naming and release URLs.
//!
//! `<name>_<version>_<os>_<arch>.tar.gz`, published under `<base>/v<version>/`
//! next to `checksums.txt`.

use serde::Serialize;

use crate::error::InstallError;
use crate::platform::TargetDescriptor;

/// File name of the checksum manifest published with every release.
pub const MANIFEST_FILENAME: &str = "checksums.txt";

/// Archive extension of release artifacts.
pub const ARCHIVE_EXT: &str = ".tar.gz";

/// Everything needed to name and locate one release artifact. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    name: String,
    version: String,
    target: TargetDescriptor,
    base_url: String,
}

impl ArtifactRef {
    /// Builds the reference. A leading `v` on `version` is dropped (`v1.2.3`
    /// and `1.2.3` name the same release); trailing `/` on `base_url` is ignored.
    pub fn new(
        name: &str,
        version: &str,
        target: TargetDescriptor,
        base_url: &str,
    ) -> Result<Self, InstallError> {
        let trimmed = version.trim();
        let version = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if version.is_empty() || version.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(InstallError::InvalidVersion {
                version: trimmed.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            target,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    /// Release tag, `v<version>`.
    pub fn tag(&self) -> String {
        format!("v{}", self.version)
    }

    /// Archive file name, also the key looked up in the manifest.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}_{}{}",
            self.name, self.version, self.target.os, self.target.arch, ARCHIVE_EXT
        )
    }

    fn release_dir(&self) -> String {
        format!("{}/{}", self.base_url, self.tag())
    }

    pub fn archive_url(&self) -> String {
        format!("{}/{}", self.release_dir(), self.file_name())
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/{}", self.release_dir(), MANIFEST_FILENAME)
    }
}
