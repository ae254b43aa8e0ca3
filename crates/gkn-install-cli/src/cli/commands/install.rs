//! `gkn-install install`: run the full download-verify-install pipeline.

use anyhow::Result;
use gkn_install_core::{CancelToken, InstallReport, Installer};

pub async fn run_install(installer: &Installer, json: bool) -> Result<()> {
    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling install");
                cancel.cancel();
            }
        })
    };

    let result = installer.install(&cancel).await;
    interrupt.abort();
    let report = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &InstallReport) {
    println!(
        "installed {} {} ({}) -> {}",
        report.artifact,
        report.version,
        report.target,
        report.installed_path.display()
    );
    println!("  sha256 {}  {} bytes", report.digest, report.bytes);
}
