//! CLI for the gkn release installer.

mod commands;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use gkn_install_core::config::{self, InstallerConfig};
use gkn_install_core::{InstallRequest, Installer};
use std::path::{Path, PathBuf};

use commands::{
    run_checksum, run_completions, run_install, run_manpage, run_resolve, run_verify,
};

/// Top-level CLI for the gkn release installer.
#[derive(Debug, Parser)]
#[command(name = "gkn-install")]
#[command(about = "Download, verify and install a prebuilt gkn release binary", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the XDG config dir.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Release selection shared by `install` and `resolve`. Flags override config.
#[derive(Debug, Clone, Default, Args)]
pub struct ReleaseArgs {
    /// Release version, with or without a leading `v`.
    pub version: Option<String>,

    /// Download base; artifacts are fetched from `<BASE_URL>/v<VERSION>/`.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory receiving the executable.
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Project name used in artifact file names.
    #[arg(long)]
    pub name: Option<String>,

    /// Raw OS identifier to resolve instead of the running host's.
    #[arg(long)]
    pub os: Option<String>,

    /// Raw CPU identifier to resolve instead of the running host's.
    #[arg(long)]
    pub arch: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download, verify and install the release binary for this platform.
    Install {
        #[command(flatten)]
        release: ReleaseArgs,

        /// Print the install report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show artifact name, URLs and install path without downloading anything.
    Resolve {
        #[command(flatten)]
        release: ReleaseArgs,

        /// Print the plan as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Verify a local archive against a local checksums.txt.
    Verify {
        /// Release archive; looked up in the manifest by its file name.
        archive: PathBuf,
        /// Checksum manifest.
        manifest: PathBuf,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Print the man page (roff).
    Manpage,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Install { release, json } => {
                let loaded = load_config(cli.config.as_deref())?;
                run_install(&installer_for(&loaded, &release)?, json).await?;
            }
            CliCommand::Resolve { release, json } => {
                let loaded = load_config(cli.config.as_deref())?;
                run_resolve(&installer_for(&loaded, &release)?, json)?;
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
            CliCommand::Verify { archive, manifest } => run_verify(&archive, &manifest).await?,
            CliCommand::Completions { shell } => run_completions(shell)?,
            CliCommand::Manpage => run_manpage()?,
        }

        Ok(())
    }
}

/// Configuration plus the file it came from, if any.
#[derive(Debug, Default)]
pub(crate) struct LoadedConfig {
    pub cfg: InstallerConfig,
    pub path: Option<PathBuf>,
}

/// `--config` must load. The XDG file is optional: without a usable config
/// home the run goes on with built-in defaults.
fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let loaded = match explicit {
        Some(p) => LoadedConfig {
            cfg: config::load_from_path(p)?,
            path: Some(p.to_path_buf()),
        },
        None => match config::config_path() {
            Ok(p) => LoadedConfig {
                cfg: config::load_or_init_at(&p)?,
                path: Some(p),
            },
            Err(e) => {
                tracing::warn!("no config location, using built-in defaults: {:#}", e);
                LoadedConfig::default()
            }
        },
    };
    tracing::debug!("loaded config: {:?}", loaded.cfg);
    Ok(loaded)
}

/// Apply command-line overrides on top of the loaded config and build the installer.
pub(crate) fn installer_for(loaded: &LoadedConfig, args: &ReleaseArgs) -> Result<Installer> {
    let mut cfg = loaded.cfg.clone();
    if let Some(base_url) = &args.base_url {
        cfg.release.base_url = base_url.clone();
    }
    if let Some(name) = &args.name {
        cfg.release.name = name.clone();
    }
    if let Some(bin_dir) = &args.bin_dir {
        cfg.bin_dir = Some(bin_dir.clone());
    }

    let version = match args.version.clone().or_else(|| cfg.resolve_version()) {
        Some(v) => v,
        None => match &loaded.path {
            Some(p) => bail!(
                "no release version: pass VERSION or set release.version in {}",
                p.display()
            ),
            None => bail!("no release version: pass VERSION"),
        },
    };

    let mut request = InstallRequest::from_config(&cfg, &version);
    if let Some(os) = &args.os {
        request.raw_os = os.clone();
    }
    if let Some(arch) = &args.arch {
        request.raw_arch = arch.clone();
    }
    Ok(Installer::from_config(&cfg, request))
}

#[cfg(test)]
mod tests;
