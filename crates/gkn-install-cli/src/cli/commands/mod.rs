//! CLI command handlers, one file per command.

mod checksum;
mod completions;
mod install;
mod manpage;
mod resolve;
mod verify;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use install::run_install;
pub use manpage::run_manpage;
pub use resolve::run_resolve;
pub use verify::run_verify;
