pub mod config;
pub mod logging;

// Download-verify-install pipeline, leaf-first.
pub mod archive;
pub mod artifact;
pub mod cancel;
pub mod checksum;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod placement;
pub mod platform;
pub mod retriever;
pub mod workspace;

pub use cancel::CancelToken;
pub use error::{InstallError, InstallFailure, InstallStep};
pub use installer::{InstallPlan, InstallReport, InstallRequest, Installer};
