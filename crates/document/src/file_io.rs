//! Filesystem helpers for loading, saving and modification tracking.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use quire_core::{IoErrorKind, IoFailure};

use crate::constants;

/// Raw file content with the metadata needed by a document.
pub(crate) struct FileContent {
    pub bytes: Vec<u8>,
    pub mtime: Option<SystemTime>,
    pub readonly: bool,
}

/// Read a file in chunks, reporting progress and honouring `cancel`.
pub(crate) fn read_file(
    path: &Path,
    cancel: &AtomicBool,
    mut progress: impl FnMut(u64, u64),
) -> Result<FileContent, IoFailure> {
    let metadata = fs::metadata(path)?;
    if metadata.is_dir() {
        return Err(IoFailure::new(
            IoErrorKind::IsDirectory,
            format!("{} is a directory", path.display()),
        ));
    }
    if metadata.len() > constants::MAX_FILE_SIZE {
        return Err(IoFailure::new(
            IoErrorKind::TooLarge,
            format!(
                "File is too large to open ({:.1} MB). Maximum allowed size is {} MB.",
                metadata.len() as f64 / constants::MEGABYTE as f64,
                constants::MAX_FILE_SIZE / constants::MEGABYTE
            ),
        ));
    }

    let total = metadata.len();
    let mut file = File::open(path)?;
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; constants::CHUNK_SIZE];
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(IoFailure::cancelled());
        }
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        progress(bytes.len() as u64, total);
    }

    Ok(FileContent {
        bytes,
        mtime: metadata.modified().ok(),
        readonly: metadata.permissions().readonly(),
    })
}

/// Write `bytes` in chunks, reporting progress.
pub(crate) fn write_file(
    path: &Path,
    bytes: &[u8],
    mut progress: impl FnMut(u64, u64),
) -> Result<(), IoFailure> {
    let total = bytes.len() as u64;
    let mut file = File::create(path)?;
    let mut done = 0u64;
    for chunk in bytes.chunks(constants::CHUNK_SIZE) {
        file.write_all(chunk)?;
        done += chunk.len() as u64;
        progress(done, total);
    }
    file.sync_all()?;
    Ok(())
}

/// Path of the backup copy of `path`.
pub(crate) fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(constants::BACKUP_SUFFIX);
    path.with_file_name(name)
}

/// Copy the current file to its backup path.
///
/// With `preserve`, an existing backup is left untouched.
pub(crate) fn create_backup(path: &Path, preserve: bool) -> Result<(), IoFailure> {
    let backup = backup_path(path);
    if preserve && backup.exists() {
        return Ok(());
    }
    fs::copy(path, &backup).map(|_| ()).map_err(|e| {
        IoFailure::new(
            IoErrorKind::CantCreateBackup,
            format!("Could not create backup {}: {}", backup.display(), e),
        )
    })
}

/// Get current modification time of a file.
pub(crate) fn get_file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

/// Check if a file was modified externally by comparing modification times.
///
/// Returns `true` if `current_mtime > saved_mtime`.
pub(crate) fn was_modified_externally(path: &Path, saved_mtime: Option<SystemTime>) -> bool {
    let saved = match saved_mtime {
        Some(t) => t,
        None => return false,
    };

    match get_file_mtime(path) {
        Some(current) => current > saved,
        None => false,
    }
}
