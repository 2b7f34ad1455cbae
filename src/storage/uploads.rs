//! Storage of uploaded music library files

use std::path::{Path, PathBuf};

use log::info;

use crate::storage::error::StorageError;

/// Writes `data` into `dir` under the last component of `file_name`.
///
/// Directory parts of `file_name` are dropped so the file always lands
/// directly inside `dir`. An existing file with the same name is replaced.
pub fn save_library(dir: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
    let base_name = sanitize_file_name(file_name)
        .ok_or_else(|| StorageError::InvalidFileName(file_name.to_string()))?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(base_name);
    std::fs::write(&path, data)?;

    info!(
        "Saved uploaded library ({} bytes) to {}",
        data.len(),
        path.to_string_lossy()
    );
    Ok(path)
}

/// last path component of an uploaded file name, accepting both separators
fn sanitize_file_name(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(['/', '\\']).next()?.trim();
    match base {
        "" | "." | ".." => None,
        _ => Some(base),
    }
}
