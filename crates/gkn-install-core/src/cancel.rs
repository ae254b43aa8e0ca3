//! Cancellation for an install run.
//!
//! The CLI (or an embedding host) holds a clone of the token and flips it on
//! Ctrl-C or timeout. The retriever checks it before every request hop and
//! from curl's progress callback, so a transfer in flight is aborted too.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::InstallError;

/// Shared, cloneable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), InstallError> {
        if self.is_cancelled() {
            return Err(InstallError::Cancelled);
        }
        Ok(())
    }
}

/// Run blocking pipeline work (curl, hashing, extraction, copying) on the
/// blocking pool and await it as one unit. A panic in `f` is propagated; a
/// task dropped by runtime shutdown reads as `Cancelled`.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, InstallError>
where
    F: FnOnce() -> Result<T, InstallError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(res) => res,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(InstallError::Cancelled),
    }
}
