//! Platform resolution: host OS/CPU identifiers to release artifact naming.
//!
//! The tables are plain immutable data handed to the resolver, so resolution
//! is a pure lookup. The default table accepts both Rust (`std::env::consts`)
//! and Node (`process.platform` / `process.arch`) spellings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InstallError;

/// Resolved (os, arch) pair in the artifact naming vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TargetDescriptor {
    pub os: String,
    pub arch: String,
}

impl TargetDescriptor {
    /// Resolve the running host through `table`.
    pub fn host(table: &PlatformTable) -> Result<Self, InstallError> {
        table.resolve(std::env::consts::OS, std::env::consts::ARCH)
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Raw identifier → artifact identifier lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTable {
    pub os: BTreeMap<String, String>,
    pub arch: BTreeMap<String, String>,
}

const DEFAULT_OS: &[(&str, &str)] = &[
    ("darwin", "darwin"),
    ("macos", "darwin"),
    ("linux", "linux"),
];

const DEFAULT_ARCH: &[(&str, &str)] = &[
    ("x64", "amd64"),
    ("x86_64", "amd64"),
    ("amd64", "amd64"),
    ("arm64", "arm64"),
    ("aarch64", "arm64"),
];

impl Default for PlatformTable {
    fn default() -> Self {
        let to_map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            os: to_map(DEFAULT_OS),
            arch: to_map(DEFAULT_ARCH),
        }
    }
}

impl PlatformTable {
    /// Look up both raw identifiers. Either miss is `UnsupportedPlatform`
    /// carrying the raw values as received.
    pub fn resolve(&self, raw_os: &str, raw_arch: &str) -> Result<TargetDescriptor, InstallError> {
        match (self.os.get(raw_os), self.arch.get(raw_arch)) {
            (Some(os), Some(arch)) if !os.is_empty() && !arch.is_empty() => Ok(TargetDescriptor {
                os: os.clone(),
                arch: arch.clone(),
            }),
            _ => Err(InstallError::UnsupportedPlatform {
                os: raw_os.to_string(),
                arch: raw_arch.to_string(),
            }),
        }
    }

    /// Replace either table with a configured one; `None` keeps the current table.
    pub fn with_overrides(
        mut self,
        os: Option<BTreeMap<String, String>>,
        arch: Option<BTreeMap<String, String>>,
    ) -> Self {
        if let Some(os) = os {
            self.os = os;
        }
        if let Some(arch) = arch {
            self.arch = arch;
        }
        self
    }
}
