// ── Sysconfig file I/O ──
//
// Every write lands in a temp file next to its target and is renamed into
// place, so readers never observe a half-written ifcfg or route file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use netcfg_core::BackendError;

/// Suffixes left behind by editors and package managers.
const IGNORED_SUFFIXES: &[&str] = &[
    "~", ".bak", ".old", ".orig", ".rpmnew", ".rpmsave", ".save", ".swp", ".tmp",
];

/// Read a file, or `None` when it does not exist.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>, BackendError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BackendError::io(path, e)),
    }
}

/// Read a single-line sysfs attribute, trimmed.
pub(crate) async fn read_attr(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path)
        .await
        .ok()
        .map(|s| s.trim().to_owned())
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> Result<(), BackendError> {
    let tmp = temp_path(path);
    if let Err(e) = tokio::fs::write(&tmp, contents).await {
        return Err(BackendError::io(&tmp, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(BackendError::io(path, e));
    }
    Ok(())
}

/// Delete a file. Returns whether it existed.
pub(crate) async fn remove_if_exists(path: &Path) -> Result<bool, BackendError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BackendError::io(path, e)),
    }
}

/// Names following `prefix` among the regular files of `dir`, sorted.
///
/// A missing directory yields an empty list. Backup and temp files are
/// skipped.
pub(crate) async fn list_prefixed(dir: &Path, prefix: &str) -> Result<Vec<String>, BackendError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BackendError::io(dir, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| BackendError::io(dir, e))?
    {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(name) = file_name.strip_prefix(prefix) else {
            continue;
        };
        if !is_valid_name(name) {
            continue;
        }
        let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
        if is_file {
            names.push(name.to_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Subdirectory (or symlink to one) names of `dir`, sorted.
pub(crate) async fn list_dirs(dir: &Path) -> Result<Vec<String>, BackendError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BackendError::io(dir, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| BackendError::io(dir, e))?
    {
        // Follows symlinks: sysfs class entries link into /sys/devices.
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .is_ok_and(|m| m.is_dir());
        if !is_dir {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Interface names usable as file suffixes.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\0'])
        && !IGNORED_SUFFIXES.iter().any(|s| name.ends_with(s))
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}
