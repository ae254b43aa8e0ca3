//! Error taxonomy for the install pipeline.
//!
//! Every variant is terminal for the current run; nothing here is retried
//! internally. Each carries enough context (URL, status, digest, path) for a
//! human-readable message at the CLI.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// A typed failure from any stage of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("unsupported platform: {os} {arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("invalid release version: {version:?}")]
    InvalidVersion { version: String },

    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },

    #[error("download failed: {url} status={status}")]
    DownloadFailed { url: String, status: u32 },

    #[error("too many redirects (limit {limit}) while fetching {url}")]
    TooManyRedirects { url: String, limit: u32 },

    #[error("redirect missing location: {url} status={status}")]
    MissingRedirectTarget { url: String, status: u32 },

    #[error("invalid redirect location {location:?} from {url}")]
    InvalidRedirectTarget { url: String, location: String },

    #[error("checksum not found for artifact {filename}")]
    ChecksumNotFound { filename: String },

    #[error("checksum mismatch: expected={expected} actual={actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("invalid archive {}: {reason}", path.display())]
    InvalidArchive { path: PathBuf, reason: String },

    #[error("extracted binary not found: {}", path.display())]
    ExtractedBinaryMissing { path: PathBuf },

    #[error("{op} {}: {source}", path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("install cancelled")]
    Cancelled,
}

impl InstallError {
    /// Shorthand for wrapping an I/O failure with the operation and path it hit.
    pub fn fs(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        InstallError::Filesystem {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Pipeline stage, used to report which step of a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    /// Platform and artifact resolution, plus creation of the scratch
    /// workspace. No network I/O has happened when this step fails.
    Resolve,
    FetchManifest,
    LookupChecksum,
    FetchArtifact,
    Verify,
    Extract,
    Place,
}

impl InstallStep {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallStep::Resolve => "resolve",
            InstallStep::FetchManifest => "fetch manifest",
            InstallStep::LookupChecksum => "lookup checksum",
            InstallStep::FetchArtifact => "fetch artifact",
            InstallStep::Verify => "verify",
            InstallStep::Extract => "extract",
            InstallStep::Place => "place binary",
        }
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error surfaced by a failed run: which step, and why.
#[derive(Debug, thiserror::Error)]
#[error("{step}: {error}")]
pub struct InstallFailure {
    pub step: InstallStep,
    #[source]
    pub error: InstallError,
}

impl InstallFailure {
    pub fn new(step: InstallStep, error: InstallError) -> Self {
        Self { step, error }
    }
}

/// Attach the pipeline step to a stage result.
pub(crate) trait AtStep<T> {
    fn at(self, step: InstallStep) -> Result<T, InstallFailure>;
}

impl<T> AtStep<T> for Result<T, InstallError> {
    fn at(self, step: InstallStep) -> Result<T, InstallFailure> {
        self.map_err(|e| InstallFailure::new(step, e))
    }
}
