//! Constants for document I/O.

/// One megabyte in bytes.
pub const MEGABYTE: u64 = 1024 * 1024;

/// Maximum file size that can be loaded (50 MB).
pub const MAX_FILE_SIZE: u64 = 50 * MEGABYTE;

/// Read and write chunk size; one progress report per chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Suffix appended to the file name of backup copies.
pub const BACKUP_SUFFIX: &str = "~";
