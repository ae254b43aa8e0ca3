//! `gkn-install resolve`: show what `install` would fetch and where it would go.

use anyhow::Result;
use gkn_install_core::Installer;

pub fn run_resolve(installer: &Installer, json: bool) -> Result<()> {
    let plan = installer.plan()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }
    println!("target:      {}", plan.artifact.target());
    println!("version:     {}", plan.artifact.version());
    println!("artifact:    {}", plan.artifact_file);
    println!("archive url: {}", plan.archive_url);
    println!("manifest:    {}", plan.manifest_url);
    println!("install to:  {}", plan.destination.display());
    Ok(())
}
