//! Classified I/O failures.
//!
//! The I/O boundary maps every failure once into an `IoErrorKind`. Tabs
//! never inspect messages or OS error codes; they dispatch on the
//! classification below.
//!
//! ```text
//! load:  Cancelled ──────────────► Cancelled  (silent unwind)
//!        ConversionFallback ─────► Fallback   (degraded success)
//!        anything else ──────────► Hard
//!
//! save:  ExternallyModified ─────► ExternallyModified (retry ignoring mtime)
//!        CantCreateBackup ───────► NoBackup           (retry ignoring backup)
//!        ConversionFailed,
//!        InvalidData, PartialInput ► Encoding         (retry with encoding)
//!        anything else ──────────► Unrecoverable
//! ```

use std::fmt;

/// Closed set of failure kinds reported by document I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoErrorKind {
    /// The user cancelled the operation.
    Cancelled,
    /// Content was decoded with replacement characters.
    ConversionFallback,
    /// The file changed on disk since it was last read or written.
    ExternallyModified,
    /// The backup copy could not be written.
    CantCreateBackup,
    /// Text cannot be represented in the target encoding.
    ConversionFailed,
    InvalidData,
    PartialInput,
    NotFound,
    PermissionDenied,
    IsDirectory,
    TooLarge,
    /// The location is not on a filesystem this backend can reach.
    NotLocal,
    /// Generic document-level failure.
    Document,
    Other,
}

/// How a failed load is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorClass {
    Cancelled,
    Fallback,
    Hard,
}

/// How a failed save is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveErrorClass {
    ExternallyModified,
    NoBackup,
    Encoding,
    Unrecoverable,
}

impl SaveErrorClass {
    /// Whether the user is offered a retry.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, SaveErrorClass::Unrecoverable)
    }
}

impl IoErrorKind {
    pub fn classify_load(self) -> LoadErrorClass {
        match self {
            IoErrorKind::Cancelled => LoadErrorClass::Cancelled,
            IoErrorKind::ConversionFallback => LoadErrorClass::Fallback,
            _ => LoadErrorClass::Hard,
        }
    }

    pub fn classify_save(self) -> SaveErrorClass {
        match self {
            IoErrorKind::ExternallyModified => SaveErrorClass::ExternallyModified,
            IoErrorKind::CantCreateBackup => SaveErrorClass::NoBackup,
            IoErrorKind::ConversionFailed | IoErrorKind::InvalidData | IoErrorKind::PartialInput => {
                SaveErrorClass::Encoding
            }
            _ => SaveErrorClass::Unrecoverable,
        }
    }

    pub fn from_io_kind(kind: std::io::ErrorKind) -> Self {
        use std::io::ErrorKind;

        match kind {
            ErrorKind::NotFound => IoErrorKind::NotFound,
            ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            ErrorKind::InvalidData => IoErrorKind::InvalidData,
            ErrorKind::UnexpectedEof => IoErrorKind::PartialInput,
            _ => IoErrorKind::Other,
        }
    }
}

/// A failure delivered through an I/O terminal callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoFailure {
    pub kind: IoErrorKind,
    pub message: String,
}

impl IoFailure {
    pub fn new(kind: IoErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(IoErrorKind::Cancelled, "Operation cancelled")
    }
}

impl From<std::io::Error> for IoFailure {
    fn from(err: std::io::Error) -> Self {
        Self::new(IoErrorKind::from_io_kind(err.kind()), err.to_string())
    }
}

impl fmt::Display for IoFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for IoFailure {}
