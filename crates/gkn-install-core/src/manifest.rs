//! Checksum manifest (`checksums.txt`) parsing and lookup.
//!
//! One record per line: `<hex-digest> <filename> [...]`. Lines with fewer
//! than two whitespace-separated tokens are skipped. Duplicate filenames
//! resolve to the first record.

use std::path::Path;

use crate::error::InstallError;

/// One `(digest, filename)` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub digest: String,
    pub filename: String,
}

/// Parsed manifest, records kept in file order.
#[derive(Debug, Clone, Default)]
pub struct ChecksumManifest {
    entries: Vec<ManifestEntry>,
}

impl ChecksumManifest {
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let mut tokens = line.split_whitespace();
                let digest = tokens.next()?;
                let filename = tokens.next()?;
                Some(ManifestEntry {
                    digest: digest.to_string(),
                    filename: filename.to_string(),
                })
            })
            .collect();
        Self { entries }
    }

    /// Read and parse a manifest file. Invalid UTF-8 is replaced rather than
    /// rejected, so one bad line does not hide the others.
    pub fn read(path: &Path) -> Result<Self, InstallError> {
        let bytes = std::fs::read(path).map_err(|e| InstallError::fs("read manifest", path, e))?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Expected digest for `filename` (exact, case-sensitive match on the filename field).
    pub fn lookup(&self, filename: &str) -> Result<&str, InstallError> {
        self.entries
            .iter()
            .find(|e| e.filename == filename)
            .map(|e| e.digest.as_str())
            .ok_or_else(|| InstallError::ChecksumNotFound {
                filename: filename.to_string(),
            })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
