//! Install orchestration: resolve → fetch manifest → lookup checksum →
//! fetch artifact → verify → extract → place.
//!
//! Strictly linear; the first failing step ends the run and is reported as
//! an [`InstallFailure`] naming that step. The final binary location is only
//! written in the last step, after verification, so a failed or cancelled
//! run leaves any previous installation as it was.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::archive;
use crate::artifact::ArtifactRef;
use crate::cancel::{run_blocking, CancelToken};
use crate::checksum;
use crate::config::InstallerConfig;
use crate::error::{AtStep, InstallError, InstallFailure, InstallStep};
use crate::manifest::ChecksumManifest;
use crate::placement;
use crate::platform::{PlatformTable, TargetDescriptor};
use crate::retriever::Retriever;
use crate::workspace::ScratchWorkspace;

/// Default install directory, relative to the working directory.
pub const DEFAULT_BIN_DIR: &str = "bin";

/// What to install and where.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// Project name used in artifact file names.
    pub name: String,
    /// Executable name inside the archive (without platform suffix).
    pub binary: String,
    pub version: String,
    pub base_url: String,
    pub bin_dir: PathBuf,
    /// Raw host OS identifier fed to the platform table.
    pub raw_os: String,
    /// Raw host CPU identifier fed to the platform table.
    pub raw_arch: String,
}

impl InstallRequest {
    /// Request for the running host with release settings from `cfg`.
    pub fn from_config(cfg: &InstallerConfig, version: &str) -> Self {
        Self {
            name: cfg.release.name.clone(),
            binary: cfg.release.binary_name().to_string(),
            version: version.to_string(),
            base_url: cfg.release.base_url.clone(),
            bin_dir: cfg
                .bin_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BIN_DIR)),
            raw_os: std::env::consts::OS.to_string(),
            raw_arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Fully resolved run, computed before any I/O.
#[derive(Debug, Clone, Serialize)]
pub struct InstallPlan {
    pub artifact: ArtifactRef,
    pub artifact_file: String,
    pub archive_url: String,
    pub manifest_url: String,
    /// File name expected at the top of the extracted archive.
    pub binary_file: String,
    pub destination: PathBuf,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub artifact: String,
    pub version: String,
    pub target: TargetDescriptor,
    /// SHA-256 of the verified archive.
    pub digest: String,
    pub installed_path: PathBuf,
    pub bytes: u64,
}

/// Runs the pipeline for one [`InstallRequest`].
#[derive(Debug, Clone)]
pub struct Installer {
    request: InstallRequest,
    table: PlatformTable,
    retriever: Retriever,
    scratch_parent: Option<PathBuf>,
}

impl Installer {
    pub fn new(request: InstallRequest, table: PlatformTable, retriever: Retriever) -> Self {
        Self {
            request,
            table,
            retriever,
            scratch_parent: None,
        }
    }

    /// Installer using the platform tables and network settings of `cfg`.
    pub fn from_config(cfg: &InstallerConfig, request: InstallRequest) -> Self {
        Self::new(
            request,
            cfg.platform_table(),
            Retriever::new(cfg.network.retriever_options()),
        )
    }

    /// Create scratch workspaces under `parent` instead of the system temp dir.
    pub fn with_scratch_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(parent.into());
        self
    }

    pub fn request(&self) -> &InstallRequest {
        &self.request
    }

    /// Resolve target, artifact name, URLs and destination. Pure; no I/O.
    pub fn plan(&self) -> Result<InstallPlan, InstallError> {
        let r = &self.request;
        let target = self.table.resolve(&r.raw_os, &r.raw_arch)?;
        let artifact = ArtifactRef::new(&r.name, &r.version, target, &r.base_url)?;
        let binary_file = placement::executable_file_name(&r.binary);
        Ok(InstallPlan {
            artifact_file: artifact.file_name(),
            archive_url: artifact.archive_url(),
            manifest_url: artifact.manifest_url(),
            destination: r.bin_dir.join(&binary_file),
            binary_file,
            artifact,
        })
    }

    /// Run the whole pipeline. The scratch workspace is removed afterwards
    /// whether or not the run succeeded.
    ///
    /// Failing to create the scratch workspace is reported at
    /// [`InstallStep::Resolve`]: it is local setup that precedes any download.
    pub async fn install(&self, cancel: &CancelToken) -> Result<InstallReport, InstallFailure> {
        let plan = self.plan().at(InstallStep::Resolve)?;
        tracing::info!(
            step = %InstallStep::Resolve,
            artifact = %plan.artifact_file,
            target = %plan.artifact.target(),
            "resolved release artifact"
        );
        let workspace = match &self.scratch_parent {
            Some(parent) => ScratchWorkspace::create_in(parent),
            None => ScratchWorkspace::create(),
        }
        .at(InstallStep::Resolve)?;

        let result = self.run(&plan, &workspace, cancel).await;
        workspace.close();
        match &result {
            Ok(report) => tracing::info!(
                path = %report.installed_path.display(),
                digest = %report.digest,
                "install complete"
            ),
            Err(failure) => tracing::warn!(step = %failure.step, "install failed: {}", failure.error),
        }
        result
    }

    async fn run(
        &self,
        plan: &InstallPlan,
        workspace: &ScratchWorkspace,
        cancel: &CancelToken,
    ) -> Result<InstallReport, InstallFailure> {
        let manifest_path = workspace.manifest_path();
        tracing::info!(step = %InstallStep::FetchManifest, url = %plan.manifest_url, "fetching checksum manifest");
        self.retriever
            .fetch_async(&plan.manifest_url, &manifest_path, cancel)
            .await
            .at(InstallStep::FetchManifest)?;

        let manifest = ChecksumManifest::read(&manifest_path).at(InstallStep::LookupChecksum)?;
        let expected = manifest
            .lookup(&plan.artifact_file)
            .at(InstallStep::LookupChecksum)?
            .to_string();
        tracing::debug!(entries = manifest.len(), expected = %expected, "checksum found");

        let archive_path = workspace.archive_path(&plan.artifact_file);
        tracing::info!(step = %InstallStep::FetchArtifact, url = %plan.archive_url, "fetching artifact");
        self.retriever
            .fetch_async(&plan.archive_url, &archive_path, cancel)
            .await
            .at(InstallStep::FetchArtifact)?;

        tracing::info!(step = %InstallStep::Verify, path = %archive_path.display(), "verifying artifact");
        let digest = {
            let archive_path = archive_path.clone();
            run_blocking(move || checksum::verify_file(&archive_path, &expected))
                .await
                .at(InstallStep::Verify)?
        };

        let extract_dir = workspace.fresh_extract_dir().at(InstallStep::Extract)?;
        tracing::info!(step = %InstallStep::Extract, dest = %extract_dir.display(), "extracting artifact");
        let binary = {
            let extract_dir = extract_dir.clone();
            let binary_file = plan.binary_file.clone();
            run_blocking(move || {
                archive::extract_tar_gz(&archive_path, &extract_dir)?;
                archive::locate_binary(&extract_dir, &binary_file)
            })
            .await
            .at(InstallStep::Extract)?
        };

        cancel.check().at(InstallStep::Place)?;
        tracing::info!(step = %InstallStep::Place, dest = %plan.destination.display(), "installing binary");
        let (installed_path, bytes) = {
            let bin_dir = self.request.bin_dir.clone();
            let binary_file = plan.binary_file.clone();
            run_blocking(move || placement::place_binary(&binary, &bin_dir, &binary_file))
                .await
                .at(InstallStep::Place)?
        };

        Ok(InstallReport {
            artifact: plan.artifact_file.clone(),
            version: plan.artifact.version().to_string(),
            target: plan.artifact.target().clone(),
            digest,
            installed_path,
            bytes,
        })
    }
}

/// Verify a local archive against a local manifest, keyed by the archive's
/// file name. Returns the verified digest.
pub fn verify_local(archive_path: &Path, manifest_path: &Path) -> Result<String, InstallError> {
    let manifest = ChecksumManifest::read(manifest_path)?;
    let file_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let expected = manifest.lookup(&file_name)?;
    checksum::verify_file(archive_path, expected)
}
