//! `gkn-install verify`: check a downloaded archive against its manifest offline.

use anyhow::Result;
use gkn_install_core::installer;
use std::path::Path;

pub async fn run_verify(archive: &Path, manifest: &Path) -> Result<()> {
    let digest = installer::verify_local(archive, manifest)?;
    println!("OK  {}  {}", digest, archive.display());
    Ok(())
}
