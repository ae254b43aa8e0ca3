//! Parse HTTP response header lines into the status and `Location` of one hop.

/// Redirect statuses the retriever follows.
pub(crate) const REDIRECT_STATUSES: [u32; 4] = [301, 302, 307, 308];

pub(crate) fn is_redirect(status: u32) -> bool {
    REDIRECT_STATUSES.contains(&status)
}

/// Head of the response currently being received.
#[derive(Debug, Default)]
pub(crate) struct ResponseHead {
    pub status: Option<u32>,
    pub location: Option<String>,
}

impl ResponseHead {
    /// Feed one raw header line as delivered by curl's header callback.
    /// A status line starts a fresh head (interim 1xx responses are discarded).
    pub fn push_line(&mut self, raw: &[u8]) {
        let line = match std::str::from_utf8(raw) {
            Ok(s) => s.trim(),
            Err(_) => return,
        };
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            *self = ResponseHead {
                status: parse_status_line(line),
                location: None,
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("location") {
                let value = value.trim();
                if !value.is_empty() {
                    self.location = Some(value.to_string());
                }
            }
        }
    }

    /// True once a 2xx status line has been seen; only then is the body kept.
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}

/// `HTTP/1.1 302 Found` → `Some(302)`.
fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}
