//! HTTP(S) retrieval of release files.
//!
//! Uses the curl crate (libcurl) with automatic redirect following turned
//! off: each hop is a separate request so the redirect bound and the
//! missing-`Location` case surface as typed errors. Only 2xx bodies are
//! streamed to the destination file. No retries; the caller decides whether
//! to rerun the whole install.

mod parse;

use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cancel::{run_blocking, CancelToken};
use crate::error::InstallError;
use parse::{is_redirect, ResponseHead};

/// Default bound on followed redirects per retrieval.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = "gkn-npm-installer";

/// Transport settings for a retriever.
#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    /// Redirects followed before failing with `TooManyRedirects`.
    pub max_redirects: u32,
    pub connect_timeout: Duration,
    /// Upper bound on a single request hop, body included.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(600),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// What a successful retrieval did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// URL that finally answered 2xx.
    pub final_url: String,
    pub redirects: u32,
    /// Body bytes written to the destination.
    pub bytes: u64,
}

/// Blocking GET-to-file with bounded manual redirect following.
#[derive(Debug, Clone, Default)]
pub struct Retriever {
    opts: RetrieverOptions,
}

/// Result of one request hop.
struct Hop {
    status: u32,
    location: Option<String>,
    bytes: u64,
}

fn transport(url: &str, source: curl::Error) -> InstallError {
    InstallError::Transport {
        url: url.to_string(),
        source,
    }
}

impl Retriever {
    pub fn new(opts: RetrieverOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &RetrieverOptions {
        &self.opts
    }

    /// Downloads `url` into `dest`, creating or truncating it first.
    ///
    /// Runs in the current thread; use [`Retriever::fetch_async`] from async code.
    /// On error `dest` may hold a partial body and must not be used.
    pub fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancelToken,
    ) -> Result<FetchOutcome, InstallError> {
        cancel.check()?;
        let mut file = File::create(dest).map_err(|e| InstallError::fs("create", dest, e))?;

        let mut current = url.to_string();
        let mut redirects = 0u32;
        loop {
            cancel.check()?;
            let hop = self.request(&current, &mut file, dest, cancel)?;

            if is_redirect(hop.status) {
                if redirects >= self.opts.max_redirects {
                    return Err(InstallError::TooManyRedirects {
                        url: url.to_string(),
                        limit: self.opts.max_redirects,
                    });
                }
                let location = hop.location.ok_or_else(|| InstallError::MissingRedirectTarget {
                    url: current.clone(),
                    status: hop.status,
                })?;
                let next = resolve_location(&current, &location)?;
                redirects += 1;
                tracing::debug!(from = %current, to = %next, status = hop.status, redirects, "following redirect");
                current = next;
                continue;
            }

            if !(200..300).contains(&hop.status) {
                return Err(InstallError::DownloadFailed {
                    url: current,
                    status: hop.status,
                });
            }

            file.sync_all()
                .map_err(|e| InstallError::fs("sync", dest, e))?;
            tracing::debug!(url = %current, redirects, bytes = hop.bytes, dest = %dest.display(), "fetched");
            return Ok(FetchOutcome {
                final_url: current,
                redirects,
                bytes: hop.bytes,
            });
        }
    }

    /// Same as [`Retriever::fetch`], on the blocking pool. The caller observes a
    /// single awaitable unit that resolves once the file is written or failed.
    pub async fn fetch_async(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancelToken,
    ) -> Result<FetchOutcome, InstallError> {
        let this = self.clone();
        let url = url.to_string();
        let dest: PathBuf = dest.to_path_buf();
        let cancel = cancel.clone();
        run_blocking(move || this.fetch(&url, &dest, &cancel)).await
    }

    /// One GET without following redirects. The body is appended to `file`
    /// only when the response status is 2xx.
    fn request(
        &self,
        url: &str,
        file: &mut File,
        dest: &Path,
        cancel: &CancelToken,
    ) -> Result<Hop, InstallError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(|e| transport(url, e))?;
        easy.follow_location(false).map_err(|e| transport(url, e))?;
        easy.useragent(&self.opts.user_agent)
            .map_err(|e| transport(url, e))?;
        easy.connect_timeout(self.opts.connect_timeout)
            .map_err(|e| transport(url, e))?;
        easy.timeout(self.opts.timeout)
            .map_err(|e| transport(url, e))?;
        easy.progress(true).map_err(|e| transport(url, e))?;

        let head = RefCell::new(ResponseHead::default());
        let mut bytes = 0u64;
        let mut write_err: Option<std::io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    head.borrow_mut().push_line(data);
                    true
                })
                .map_err(|e| transport(url, e))?;
            transfer
                .write_function(|data| {
                    if !head.borrow().is_success() {
                        // redirect / error bodies are drained, never written
                        return Ok(data.len());
                    }
                    match file.write_all(data) {
                        Ok(()) => {
                            bytes += data.len() as u64;
                            Ok(data.len())
                        }
                        Err(e) => {
                            write_err = Some(e);
                            Ok(0) // abort transfer
                        }
                    }
                })
                .map_err(|e| transport(url, e))?;
            transfer
                .progress_function(|_, _, _, _| !cancel.is_cancelled())
                .map_err(|e| transport(url, e))?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if let Some(io) = write_err {
                return Err(InstallError::fs("write", dest, io));
            }
            if e.is_aborted_by_callback() && cancel.is_cancelled() {
                return Err(InstallError::Cancelled);
            }
            return Err(transport(url, e));
        }

        let status = easy.response_code().map_err(|e| transport(url, e))?;
        let head = head.into_inner();
        Ok(Hop {
            status,
            location: head.location,
            bytes,
        })
    }
}

/// Resolve a (possibly relative) `Location` against the URL that returned it.
/// Only http(s) targets are followed.
fn resolve_location(current: &str, location: &str) -> Result<String, InstallError> {
    let invalid = || InstallError::InvalidRedirectTarget {
        url: current.to_string(),
        location: location.to_string(),
    };
    let base = url::Url::parse(current).map_err(|_| invalid())?;
    let next = base.join(location).map_err(|_| invalid())?;
    match next.scheme() {
        "http" | "https" => Ok(next.into()),
        _ => Err(invalid()),
    }
}
