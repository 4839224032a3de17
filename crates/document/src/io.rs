//! The document I/O interface consumed by tabs.

use std::time::SystemTime;

use quire_core::{Encoding, IoFailure, Location, NewlineType, SaveFlags, TabId};

/// Read a location into a tab's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub tab: TabId,
    pub location: Location,
    /// `None` lets the backend guess.
    pub encoding: Option<Encoding>,
    /// Line to place the cursor on once loaded.
    pub line: usize,
    /// Treat a missing file as an empty document.
    pub create_if_missing: bool,
}

/// Write a tab's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub tab: TabId,
    pub location: Location,
    pub encoding: Encoding,
    pub newline: NewlineType,
    /// Content with `\n` line breaks.
    pub text: String,
    pub flags: SaveFlags,
    /// Modification time the document was last read or written with.
    /// `None` disables the external modification check.
    pub known_mtime: Option<SystemTime>,
}

/// Content produced by a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedContent {
    /// Content with `\n` line breaks.
    pub text: String,
    pub encoding: Encoding,
    pub newline: NewlineType,
    pub mtime: Option<SystemTime>,
    /// The file cannot be written by the current user.
    pub readonly: bool,
    /// Requested line, clamped to the document.
    pub line: usize,
}

/// Terminal result of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(LoadedContent),
    /// Loaded with a lossy conversion; the failure describes what was lost.
    Degraded(LoadedContent, IoFailure),
    Failed(IoFailure),
}

/// Metadata produced by a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedInfo {
    pub mtime: Option<SystemTime>,
}

/// Callback delivered to the event loop.
///
/// For each request, zero or more progress messages are followed by
/// exactly one terminal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoMessage {
    LoadProgress {
        tab: TabId,
        done: u64,
        total: u64,
    },
    Loaded {
        tab: TabId,
        outcome: LoadOutcome,
    },
    SaveProgress {
        tab: TabId,
        done: u64,
        total: u64,
    },
    Saved {
        tab: TabId,
        result: Result<SavedInfo, IoFailure>,
    },
}

impl IoMessage {
    pub fn tab(&self) -> TabId {
        match self {
            IoMessage::LoadProgress { tab, .. }
            | IoMessage::Loaded { tab, .. }
            | IoMessage::SaveProgress { tab, .. }
            | IoMessage::Saved { tab, .. } => *tab,
        }
    }
}

/// On-disk state compared to what a document last saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskStatus {
    Unchanged,
    Modified,
    Deleted,
}

/// Asynchronous document storage.
///
/// Start methods never fail synchronously: problems are reported through
/// the terminal message of the request.
pub trait DocumentIo {
    fn load(&mut self, request: LoadRequest);

    /// Write to the document's own location, guarded by `known_mtime`.
    fn save(&mut self, request: SaveRequest);

    /// Write to a location chosen by the user. The target was not read
    /// by this document, so no modification time guard applies.
    fn save_as(&mut self, mut request: SaveRequest) {
        request.known_mtime = None;
        self.save(request);
    }

    /// Request cancellation of the in-flight load of `tab`.
    fn load_cancel(&mut self, tab: TabId);

    /// Synchronously compare the file at `location` with `known_mtime`.
    fn disk_status(&self, location: &Location, known_mtime: Option<SystemTime>) -> DiskStatus;

    /// Collect messages produced since the last poll.
    fn poll_messages(&mut self) -> Vec<IoMessage>;
}
