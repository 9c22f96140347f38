//! Error types for buffer queries and snapshot persistence
//!
//! Logging itself never fails. Only sort dispatch, snapshot encoding and disk I/O
//! surface errors to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`LogBuffer`](crate::logging::LogBuffer) operations
#[derive(Debug, Error)]
pub enum BufferError {
    /// An unrecognized sort criterion or level name
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The snapshot path could not be written or read
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes do not decode to a valid buffer snapshot
    #[error("corrupt snapshot: {0}")]
    CorruptData(String),

    /// The buffer state could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BufferError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BufferError::Io {
            path: path.into(),
            source,
        }
    }

    /// Get a user-friendly message for this error
    pub fn user_message(&self) -> String {
        match self {
            BufferError::Io { path, source } => {
                friendly_io_error_message(source, &path.display().to_string())
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BufferError>;

/// Categories of disk errors for user-friendly messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskErrorKind {
    /// Disk is full or quota exceeded
    DiskFull,
    /// Permission denied (read or write)
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// Target file already exists (snapshots are never overwritten)
    AlreadyExists,
    /// Other IO error
    Other,
}

impl DiskErrorKind {
    /// Get a user-friendly message for this error kind
    pub fn user_message(&self) -> &'static str {
        match self {
            DiskErrorKind::DiskFull => "Disk full - free space needed to save snapshot",
            DiskErrorKind::PermissionDenied => "Permission denied",
            DiskErrorKind::NotFound => "File or directory not found",
            DiskErrorKind::AlreadyExists => "Snapshot file already exists",
            DiskErrorKind::Other => "Failed to access snapshot",
        }
    }
}

/// Categorize an IO error into a user-friendly category
pub fn categorize_io_error(e: &std::io::Error) -> DiskErrorKind {
    use std::io::ErrorKind;

    match e.kind() {
        ErrorKind::StorageFull | ErrorKind::WriteZero => DiskErrorKind::DiskFull,
        ErrorKind::PermissionDenied => DiskErrorKind::PermissionDenied,
        ErrorKind::NotFound => DiskErrorKind::NotFound,
        ErrorKind::AlreadyExists => DiskErrorKind::AlreadyExists,
        _ => {
            #[cfg(unix)]
            {
                if let Some(os_error) = e.raw_os_error() {
                    // ENOSPC = 28; EDQUOT = 122 on Linux, 69 on macOS
                    if os_error == 28 || os_error == 122 || os_error == 69 {
                        return DiskErrorKind::DiskFull;
                    }
                    // EACCES
                    if os_error == 13 {
                        return DiskErrorKind::PermissionDenied;
                    }
                }
            }
            DiskErrorKind::Other
        }
    }
}

/// Create a user-friendly error message from an IO error
pub fn friendly_io_error_message(e: &std::io::Error, context: &str) -> String {
    match categorize_io_error(e) {
        DiskErrorKind::Other => format!("{}: {}", context, e),
        kind => format!("{}: {}", context, kind.user_message()),
    }
}
