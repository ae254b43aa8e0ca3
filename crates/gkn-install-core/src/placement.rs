//! Final placement of the verified binary.
//!
//! Copies into a uniquely named `.part` file next to the destination, marks
//! it executable, syncs, then renames over the final path. A concurrent
//! invoker sees either the old binary or the complete new one. The temp file
//! lives in the destination directory so the rename stays on one filesystem.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::InstallError;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Mode applied to installed executables.
#[cfg(unix)]
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Executable file name on this platform (`gkn` or `gkn.exe`).
pub fn executable_file_name(binary: &str) -> String {
    format!("{}{}", binary, std::env::consts::EXE_SUFFIX)
}

/// Install `src` as `<bin_dir>/<file_name>`, replacing any previous file.
/// Returns the final path and the number of bytes copied.
pub fn place_binary(
    src: &Path,
    bin_dir: &Path,
    file_name: &str,
) -> Result<(PathBuf, u64), InstallError> {
    std::fs::create_dir_all(bin_dir)
        .map_err(|e| InstallError::fs("create directory", bin_dir, e))?;
    let final_path = bin_dir.join(file_name);

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(bin_dir)
        .map_err(|e| InstallError::fs("create temp file", bin_dir, e))?;
    let tmp_path = tmp.path().to_path_buf();

    let mut input = File::open(src).map_err(|e| InstallError::fs("open", src, e))?;
    let bytes = io::copy(&mut input, tmp.as_file_mut())
        .map_err(|e| InstallError::fs("copy", &tmp_path, e))?;

    set_executable(tmp.as_file()).map_err(|e| InstallError::fs("set permissions", &tmp_path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| InstallError::fs("sync", &tmp_path, e))?;

    // On failure the returned NamedTempFile is dropped and the .part removed.
    tmp.persist(&final_path)
        .map_err(|e| InstallError::fs("rename", &final_path, e.error))?;

    tracing::info!(path = %final_path.display(), bytes, "binary installed");
    Ok((final_path, bytes))
}

#[cfg(unix)]
fn set_executable(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn set_executable(_file: &File) -> io::Result<()> {
    Ok(())
}
