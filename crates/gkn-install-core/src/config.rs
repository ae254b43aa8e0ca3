use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::platform::PlatformTable;
use crate::retriever::{RetrieverOptions, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};

/// Default release download base (GitHub releases of the gkn project).
pub const DEFAULT_BASE_URL: &str = "https://github.com/TT-AIXion/github-kanri/releases/download";

/// Environment variable npm sets for lifecycle scripts; used as version fallback.
pub const NPM_VERSION_ENV: &str = "npm_package_version";

/// Where releases live and what they are called.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Project name, first component of artifact file names.
    pub name: String,
    /// Base URL; artifacts live under `<base_url>/v<version>/`.
    pub base_url: String,
    /// Release version to install when none is given on the command line.
    pub version: Option<String>,
    /// Executable name inside the archive; defaults to `name`.
    pub binary: Option<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            name: "gkn".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            version: None,
            binary: None,
        }
    }
}

impl ReleaseConfig {
    pub fn binary_name(&self) -> &str {
        self.binary.as_deref().unwrap_or(&self.name)
    }
}

/// Transport parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Maximum redirects followed per download.
    pub max_redirects: u32,
    pub connect_timeout_secs: u64,
    /// Upper bound for one request, body included.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            connect_timeout_secs: 30,
            timeout_secs: 600,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn retriever_options(&self) -> RetrieverOptions {
        RetrieverOptions {
            max_redirects: self.max_redirects,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Replacement platform tables; a missing map keeps the built-in one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub os: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub arch: Option<BTreeMap<String, String>>,
}

/// Global configuration loaded from `~/.config/gkn-install/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallerConfig {
    /// Directory receiving the executable (None = `./bin`).
    #[serde(default)]
    pub bin_dir: Option<PathBuf>,
    #[serde(default)]
    pub release: ReleaseConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub platform: Option<PlatformConfig>,
}

impl InstallerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse installer config")
    }

    /// Built-in tables with any configured replacements applied.
    pub fn platform_table(&self) -> PlatformTable {
        match &self.platform {
            Some(p) => PlatformTable::default().with_overrides(p.os.clone(), p.arch.clone()),
            None => PlatformTable::default(),
        }
    }

    /// Version from config, else from the npm lifecycle environment.
    pub fn resolve_version(&self) -> Option<String> {
        self.release
            .version
            .clone()
            .or_else(|| std::env::var(NPM_VERSION_ENV).ok())
            .filter(|v| !v.trim().is_empty())
    }
}

/// `$XDG_CONFIG_HOME/gkn-install/config.toml`. Does not touch the filesystem.
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("gkn-install")?;
    Ok(xdg_dirs
        .get_config_home()
        .join("gkn-install")
        .join("config.toml"))
}

/// Load configuration from `path`.
pub fn load_from_path(path: &Path) -> Result<InstallerConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    InstallerConfig::from_toml_str(&data).with_context(|| format!("in {}", path.display()))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<InstallerConfig> {
    load_or_init_at(&config_path()?)
}

/// Load `path`, or write the defaults there when it does not exist yet.
///
/// The file is optional: if the defaults cannot be written (read-only HOME,
/// sandboxed package install) the run continues on built-in defaults. An
/// existing file that cannot be read or parsed is still an error.
pub fn load_or_init_at(path: &Path) -> Result<InstallerConfig> {
    if path.exists() {
        return load_from_path(path);
    }
    let default_cfg = InstallerConfig::default();
    match write_default(path, &default_cfg) {
        Ok(()) => tracing::info!("created default config at {}", path.display()),
        Err(e) => tracing::warn!("using built-in config defaults: {:#}", e),
    }
    Ok(default_cfg)
}

fn write_default(path: &Path, cfg: &InstallerConfig) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    fs::write(path, toml).with_context(|| format!("create config {}", path.display()))?;
    Ok(())
}
