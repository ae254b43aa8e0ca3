//! `.tar.gz` extraction into the scratch workspace.
//!
//! Entry paths are kept as-is (no root stripping); the expected executable
//! must sit at the top of the archive. Entries escaping the destination
//! (absolute paths, `..`) reject the whole archive.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::InstallError;

fn invalid(archive_path: &Path, reason: impl Into<String>) -> InstallError {
    InstallError::InvalidArchive {
        path: archive_path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Unpack `archive_path` into `dest_dir` (created if missing). Returns the
/// number of regular files written.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<usize, InstallError> {
    std::fs::create_dir_all(dest_dir)
        .map_err(|e| InstallError::fs("create directory", dest_dir, e))?;

    let file = File::open(archive_path).map_err(|e| InstallError::fs("open", archive_path, e))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);

    let entries = archive
        .entries()
        .map_err(|e| invalid(archive_path, e.to_string()))?;

    let mut files = 0usize;
    for entry in entries {
        let mut entry = entry.map_err(|e| invalid(archive_path, e.to_string()))?;
        let entry_path: PathBuf = entry
            .path()
            .map_err(|e| invalid(archive_path, e.to_string()))?
            .into_owned();

        if entry_path.is_absolute()
            || entry_path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(invalid(
                archive_path,
                format!("refusing entry outside destination: {}", entry_path.display()),
            ));
        }

        let output_path = dest_dir.join(&entry_path);
        let kind = entry.header().entry_type();
        if kind.is_dir() {
            std::fs::create_dir_all(&output_path)
                .map_err(|e| InstallError::fs("create directory", &output_path, e))?;
            continue;
        }
        if !(kind.is_file() || kind.is_symlink() || kind.is_hard_link()) {
            tracing::debug!(entry = %entry_path.display(), "skipping special archive entry");
            continue;
        }
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| InstallError::fs("create directory", parent, e))?;
        }
        let unpacked = entry
            .unpack_in(dest_dir)
            .map_err(|e| InstallError::fs("extract", &output_path, e))?;
        if !unpacked {
            return Err(invalid(
                archive_path,
                format!("refusing entry outside destination: {}", entry_path.display()),
            ));
        }
        if kind.is_file() {
            files += 1;
        }
    }

    tracing::debug!(archive = %archive_path.display(), dest = %dest_dir.display(), files, "extracted");
    Ok(files)
}

/// Path of the expected executable inside `extract_dir`; must be a regular file.
pub fn locate_binary(extract_dir: &Path, file_name: &str) -> Result<PathBuf, InstallError> {
    let path = extract_dir.join(file_name);
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Ok(path),
        _ => Err(InstallError::ExtractedBinaryMissing { path }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    /// Build a `.tar.gz` holding `(path, body, mode)` regular files.
    fn build_tar_gz(files: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let enc = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(enc);
        for (path, body, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, path, *body).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn extracts_flat_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("gkn.tar.gz");
        std::fs::write(
            &archive,
            build_tar_gz(&[
                ("gkn", b"#!/bin/sh\necho gkn\n", 0o755),
                ("README.md", b"readme", 0o644),
                ("LICENSE", b"MIT", 0o644),
            ]),
        )
        .unwrap();
        let out = dir.path().join("extract");
        assert_eq!(extract_tar_gz(&archive, &out).unwrap(), 3);
        let bin = locate_binary(&out, "gkn").unwrap();
        assert_eq!(std::fs::read(bin).unwrap(), b"#!/bin/sh\necho gkn\n");
    }

    #[test]
    fn nested_entries_create_parents() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        std::fs::write(&archive, build_tar_gz(&[("docs/man/gkn.1", b"man", 0o644)])).unwrap();
        let out = dir.path().join("extract");
        extract_tar_gz(&archive, &out).unwrap();
        assert!(out.join("docs/man/gkn.1").is_file());
    }

    #[test]
    fn missing_binary_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        std::fs::write(&archive, build_tar_gz(&[("other", b"x", 0o755)])).unwrap();
        let out = dir.path().join("extract");
        extract_tar_gz(&archive, &out).unwrap();
        match locate_binary(&out, "gkn") {
            Err(InstallError::ExtractedBinaryMissing { path }) => assert_eq!(path, out.join("gkn")),
            other => panic!("expected ExtractedBinaryMissing, got {other:?}"),
        }
    }

    #[test]
    fn directory_named_like_binary_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("extract");
        std::fs::create_dir_all(out.join("gkn")).unwrap();
        assert!(matches!(
            locate_binary(&out, "gkn"),
            Err(InstallError::ExtractedBinaryMissing { .. })
        ));
    }

    #[test]
    fn garbage_is_invalid_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.tar.gz");
        std::fs::write(&archive, b"definitely not gzip").unwrap();
        assert!(matches!(
            extract_tar_gz(&archive, &dir.path().join("extract")),
            Err(InstallError::InvalidArchive { .. })
        ));
    }

    #[test]
    fn parent_dir_entry_rejects_archive() {
        let dir = tempfile::tempdir().unwrap();
        // Builder::append_data refuses `..`, so write the raw name field.
        let mut header = tar::Header::new_gnu();
        let name = b"../escape";
        header.as_gnu_mut().unwrap().name[..name.len()].copy_from_slice(name);
        header.set_size(1);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        builder.append(&header, &b"x"[..]).unwrap();
        let bytes = builder.into_inner().unwrap().finish().unwrap();

        let archive = dir.path().join("evil.tar.gz");
        std::fs::write(&archive, bytes).unwrap();
        let out = dir.path().join("extract");
        assert!(matches!(
            extract_tar_gz(&archive, &out),
            Err(InstallError::InvalidArchive { .. })
        ));
        assert!(!dir.path().join("escape").exists());
    }
}
