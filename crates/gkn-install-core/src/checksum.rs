//! SHA-256 integrity verification of downloaded artifacts.
//!
//! Digests are lowercase hex, the same form published in `checksums.txt`.
//! Comparison is exact string equality; a mismatch is always fatal.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::InstallError;

const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha256_path(path: &Path) -> io::Result<String> {
    let mut f = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hash `path` and compare against `expected`. Returns the actual digest on match.
pub fn verify_file(path: &Path, expected: &str) -> Result<String, InstallError> {
    let actual = sha256_path(path).map_err(|e| InstallError::fs("hash", path, e))?;
    if actual != expected {
        tracing::warn!(
            path = %path.display(),
            expected,
            actual = %actual,
            "checksum mismatch"
        );
        return Err(InstallError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    tracing::debug!(path = %path.display(), digest = %actual, "checksum verified");
    Ok(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HELLO_SHA256: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

    #[test]
    fn sha256_path_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let digest = sha256_path(f.path()).unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_path_known_content() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        assert_eq!(sha256_path(f.path()).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn sha256_spans_multiple_buffers() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        let body: Vec<u8> = (0u8..=255).cycle().take(BUF_SIZE * 3 + 17).collect();
        f.write_all(&body).unwrap();
        f.flush().unwrap();
        let expected = hex::encode(Sha256::digest(&body));
        assert_eq!(sha256_path(f.path()).unwrap(), expected);
    }

    #[test]
    fn verify_file_match_returns_digest() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        assert_eq!(verify_file(f.path(), HELLO_SHA256).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn single_byte_corruption_is_mismatch() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hellp\n").unwrap();
        f.flush().unwrap();
        match verify_file(f.path(), HELLO_SHA256) {
            Err(InstallError::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, HELLO_SHA256);
                assert_ne!(actual, HELLO_SHA256);
                assert_eq!(actual.len(), 64);
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn uppercase_expected_is_not_normalized() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        let upper = HELLO_SHA256.to_uppercase();
        assert!(matches!(
            verify_file(f.path(), &upper),
            Err(InstallError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn missing_file_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            verify_file(&dir.path().join("nope"), HELLO_SHA256),
            Err(InstallError::Filesystem { op: "hash", .. })
        ));
    }
}
