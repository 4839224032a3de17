//! Document content and file metadata.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::SystemTime;

use quire_core::{Encoding, Location, NewlineType};

use crate::LoadedContent;

static NEXT_UNTITLED: AtomicU32 = AtomicU32::new(1);

/// The text of one tab and what is known about its file.
#[derive(Debug, Clone)]
pub struct Document {
    location: Option<Location>,
    untitled_number: u32,
    text: String,
    encoding: Encoding,
    newline: NewlineType,
    modified: bool,
    readonly: bool,
    deleted: bool,
    mtime: Option<SystemTime>,
    cursor_line: usize,
}

impl Document {
    /// Empty, untitled document.
    pub fn new() -> Self {
        Self {
            location: None,
            untitled_number: NEXT_UNTITLED.fetch_add(1, Ordering::Relaxed),
            text: String::new(),
            encoding: Encoding::default(),
            newline: NewlineType::default(),
            modified: false,
            readonly: false,
            deleted: false,
            mtime: None,
            cursor_line: 0,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Point the document at `location` ahead of loading it.
    pub fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    pub fn is_untitled(&self) -> bool {
        self.location.is_none()
    }

    pub fn is_local(&self) -> bool {
        self.location.as_ref().is_some_and(Location::is_local)
    }

    /// File name, or "Untitled Document N".
    pub fn short_name(&self) -> String {
        match &self.location {
            Some(location) => location.display_name(),
            None => format!("Untitled Document {}", self.untitled_number),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the content as an edit would.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.modified = true;
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn newline(&self) -> NewlineType {
        self.newline
    }

    pub fn set_newline(&mut self, newline: NewlineType) {
        self.newline = newline;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    /// The file was removed from disk while open.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    pub fn mtime(&self) -> Option<SystemTime> {
        self.mtime
    }

    pub fn cursor_line(&self) -> usize {
        self.cursor_line
    }

    /// Take over freshly loaded content.
    pub fn apply_loaded(&mut self, location: Location, content: LoadedContent) {
        self.location = Some(location);
        self.text = content.text;
        self.encoding = content.encoding;
        self.newline = content.newline;
        self.mtime = content.mtime;
        self.readonly = content.readonly;
        self.cursor_line = content.line;
        self.modified = false;
        self.deleted = false;
    }

    /// Record a successful write of the current content.
    pub fn apply_saved(
        &mut self,
        location: Location,
        encoding: Encoding,
        mtime: Option<SystemTime>,
    ) {
        self.location = Some(location);
        self.encoding = encoding;
        self.mtime = mtime;
        self.modified = false;
        self.deleted = false;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
