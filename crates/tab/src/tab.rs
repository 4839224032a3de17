//! The `Tab` type: state, notices, events and closing.

use std::time::Instant;

use anyhow::{bail, Result};

use quire_config::EditorSettings;
use quire_core::{
    middle_truncate, Encoding, Location, Lockdown, Notice, ProgressKind, SaveFlags, TabEvent,
    TabId, TabState,
};
use quire_document::{DiskStatus, Document, DocumentIo, LoadRequest};
use quire_print::{PageSetup, PreviewHandle, PrintJob, PrintSettings};

use crate::auto_save::AutoSaveTimer;

/// Tab names longer than this are shortened in the middle.
pub const MAX_NAME_LENGTH: usize = 40;

/// Progress messages longer than this are shortened in the middle.
pub(crate) const MAX_MESSAGE_LENGTH: usize = 100;

/// A load whose progress projects more remaining time than this shows a
/// progress notice.
pub(crate) const PROGRESS_NOTICE_THRESHOLD_SECS: f64 = 3.0;

/// Auto-save preferences a tab starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSettings {
    pub auto_save: bool,
    /// Minutes, always positive.
    pub auto_save_interval: u32,
}

impl TabSettings {
    /// Derive from the editor configuration. The save-to-disk lockdown
    /// forces auto-save off.
    pub fn from_config(editor: &EditorSettings, lockdown: Lockdown) -> Self {
        Self {
            auto_save: editor.auto_save && !lockdown.contains(Lockdown::SAVE_TO_DISK),
            auto_save_interval: editor.auto_save_interval_minutes(),
        }
    }
}

impl Default for TabSettings {
    fn default() -> Self {
        Self::from_config(&EditorSettings::default(), Lockdown::empty())
    }
}

/// Parameters of the load or revert in flight, kept for retries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingLoad {
    pub encoding: Option<Encoding>,
    pub line: usize,
    pub create_if_missing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveKind {
    Save,
    SaveAs,
}

/// Target of the save in flight, kept until it succeeds or is abandoned.
#[derive(Debug, Clone)]
pub(crate) struct PendingSave {
    pub location: Location,
    pub encoding: Encoding,
    pub flags: SaveFlags,
    pub kind: SaveKind,
}

/// One open document and its lifecycle.
pub struct Tab {
    pub(crate) id: TabId,
    pub(crate) state: TabState,
    pub(crate) document: Document,
    pub(crate) notice: Option<Notice>,
    pub(crate) pending_load: Option<PendingLoad>,
    pub(crate) pending_save: Option<PendingSave>,
    /// Flags carried by every manual save, reset by save-as.
    pub(crate) save_flags: SaveFlags,
    pub(crate) auto_save_enabled: bool,
    pub(crate) auto_save_interval: u32,
    pub(crate) auto_save_timer: Option<AutoSaveTimer>,
    pub(crate) not_editable: bool,
    pub(crate) ask_if_externally_modified: bool,
    /// Set by the first progress report of the operation in flight.
    pub(crate) progress_started: Option<Instant>,
    pub(crate) print_job: Option<Box<dyn PrintJob>>,
    pub(crate) print_preview: Option<PreviewHandle>,
    pub(crate) page_setup: Option<PageSetup>,
    pub(crate) print_settings: Option<PrintSettings>,
    pub(crate) events: Vec<TabEvent>,
}

impl Tab {
    /// Empty untitled tab in `Normal`.
    pub fn new(settings: TabSettings) -> Self {
        let tab = Self {
            id: TabId::next(),
            state: TabState::Normal,
            document: Document::new(),
            notice: None,
            pending_load: None,
            pending_save: None,
            save_flags: SaveFlags::empty(),
            auto_save_enabled: settings.auto_save,
            auto_save_interval: settings.auto_save_interval.max(1),
            auto_save_timer: None,
            not_editable: false,
            ask_if_externally_modified: true,
            progress_started: None,
            print_job: None,
            print_preview: None,
            page_setup: None,
            print_settings: None,
            events: Vec::new(),
        };
        log::debug!("Created {}", tab.id);
        tab
    }

    /// Tab that immediately starts loading `location`.
    pub fn new_from_location(
        settings: TabSettings,
        io: &mut dyn DocumentIo,
        location: Location,
        encoding: Option<Encoding>,
        line: usize,
        create_if_missing: bool,
    ) -> Self {
        let mut tab = Self::new(settings);
        tab.start_load(
            io,
            TabState::Loading,
            location,
            PendingLoad {
                encoding,
                line,
                create_if_missing,
            },
        );
        tab.events.clear();
        tab
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn state(&self) -> TabState {
        self.state
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn location(&self) -> Option<&Location> {
        self.document.location()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Location of the save in flight.
    pub fn pending_save_location(&self) -> Option<&Location> {
        self.pending_save.as_ref().map(|p| &p.location)
    }

    /// Encoding of the load or save in flight.
    pub fn pending_encoding(&self) -> Option<Encoding> {
        match (&self.pending_save, &self.pending_load) {
            (Some(save), _) => Some(save.encoding),
            (None, Some(load)) => load.encoding,
            (None, None) => None,
        }
    }

    pub fn save_flags(&self) -> SaveFlags {
        self.save_flags
    }

    pub fn is_not_editable(&self) -> bool {
        self.not_editable
    }

    pub fn ask_if_externally_modified(&self) -> bool {
        self.ask_if_externally_modified
    }

    pub fn print_preview(&self) -> Option<PreviewHandle> {
        self.print_preview
    }

    pub fn has_print_job(&self) -> bool {
        self.print_job.is_some()
    }

    /// Page setup of the last successful print of this document.
    pub fn page_setup(&self) -> Option<&PageSetup> {
        self.page_setup.as_ref()
    }

    /// Print settings of the last successful print of this document.
    pub fn print_settings(&self) -> Option<&PrintSettings> {
        self.print_settings.as_ref()
    }

    /// Drain events emitted since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<TabEvent> {
        std::mem::take(&mut self.events)
    }

    /// Title shown in the tab bar.
    pub fn name(&self) -> String {
        let name = middle_truncate(&self.document.short_name(), MAX_NAME_LENGTH);
        if self.document.is_modified() {
            format!("*{}", name)
        } else {
            name
        }
    }

    /// Longer description shown when hovering the tab.
    pub fn tooltip(&self) -> String {
        let Some(location) = self.document.location() else {
            return self.document.short_name();
        };
        match self.state {
            TabState::LoadingError => format!("Error opening file {}", location),
            TabState::RevertingError => format!("Error reverting file {}", location),
            TabState::SavingError => format!("Error saving file {}", location),
            _ => format!(
                "Name: {}\nEncoding: {}",
                location,
                self.document.encoding()
            ),
        }
    }

    /// Replace the document content as the user would by editing.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        if self.not_editable || self.document.is_readonly() {
            return self.reject("edit a read-only document");
        }
        if !matches!(self.state, TabState::Normal | TabState::ShowingPrintPreview) {
            return self.reject("edit");
        }
        let was_modified = self.document.is_modified();
        self.document.set_text(text);
        if !was_modified {
            self.events.push(TabEvent::NameChanged);
        }
        Ok(())
    }

    /// Force the read-only flag, for example from a "view read-only" choice.
    pub fn set_readonly(&mut self, readonly: bool) {
        if self.document.is_readonly() != readonly {
            self.document.set_readonly(readonly);
            self.sync_auto_save();
            self.events.push(TabEvent::NameChanged);
        }
    }

    /// Whether closing now would lose nothing.
    pub fn can_close(&self) -> bool {
        match self.state {
            TabState::Loading
            | TabState::LoadingError
            | TabState::Reverting
            | TabState::RevertingError => true,
            TabState::SavingError => false,
            _ => !self.document.is_modified() && !self.document.is_deleted(),
        }
    }

    /// Enter `Closing` if nothing would be lost.
    pub fn mark_for_closing(&mut self, io: &mut dyn DocumentIo) -> Result<()> {
        if !self.can_close() {
            return self.reject("close with unsaved changes");
        }
        self.begin_close(io)
    }

    /// Enter `Closing` unconditionally, abandoning loads and print jobs.
    ///
    /// The caller has already dealt with unsaved changes.
    pub fn begin_close(&mut self, io: &mut dyn DocumentIo) -> Result<()> {
        match self.state {
            TabState::Closing => return Ok(()),
            TabState::Saving => return self.reject("close while saving"),
            TabState::Loading | TabState::Reverting => io.load_cancel(self.id),
            _ => {}
        }
        if let Some(mut job) = self.print_job.take() {
            job.cancel();
        }
        self.print_preview = None;
        self.set_notice(None);
        self.pending_load = None;
        self.pending_save = None;
        self.set_state(TabState::Closing);
        Ok(())
    }

    /// Called when the view regains focus: compare the file on disk with
    /// what was last read or written and ask the user if it changed.
    ///
    /// Returns whether a notice was raised.
    pub fn check_externally_modified(&mut self, io: &dyn DocumentIo) -> bool {
        if self.state != TabState::Normal
            || !self.ask_if_externally_modified
            || !self.document.is_local()
        {
            return false;
        }
        let Some(location) = self.document.location().cloned() else {
            return false;
        };

        match io.disk_status(&location, self.document.mtime()) {
            DiskStatus::Unchanged => false,
            DiskStatus::Deleted => {
                if !self.document.is_deleted() {
                    log::info!("{} was deleted from disk", location);
                    self.document.set_deleted(true);
                    self.events.push(TabEvent::NameChanged);
                }
                false
            }
            DiskStatus::Modified => {
                log::info!("{} changed on disk", location);
                self.set_notice(Some(Notice::ExternallyModified {
                    location,
                    document_modified: self.document.is_modified(),
                }));
                self.set_state(TabState::ExternallyModifiedNotification);
                true
            }
        }
    }

    // ========================================================================
    // Internal helpers shared by the operation modules
    // ========================================================================

    /// Change state, keeping the auto-save timer consistent with it.
    pub(crate) fn set_state(&mut self, state: TabState) {
        if self.state == state {
            return;
        }
        log::debug!("{}: {} -> {}", self.id, self.state, state);
        self.state = state;
        self.sync_auto_save();
        self.events.push(TabEvent::StateChanged(state));
        self.events.push(TabEvent::NameChanged);
    }

    pub(crate) fn set_notice(&mut self, notice: Option<Notice>) {
        if self.notice.is_none() && notice.is_none() {
            return;
        }
        self.notice = notice;
        self.events.push(TabEvent::NoticeChanged);
    }

    /// Log and report a call that the current state does not allow.
    pub(crate) fn reject<T>(&self, operation: &str) -> Result<T> {
        log::error!("{}: cannot {} in state {}", self.id, operation, self.state);
        bail!("{}: cannot {} in state {}", self.id, operation, self.state)
    }

    /// Issue a load of `location` and enter `state` (`Loading` or `Reverting`).
    pub(crate) fn start_load(
        &mut self,
        io: &mut dyn DocumentIo,
        state: TabState,
        location: Location,
        pending: PendingLoad,
    ) {
        self.set_notice(None);
        self.not_editable = false;
        self.progress_started = None;
        self.document.set_location(location.clone());
        self.pending_load = Some(pending);
        self.set_state(state);
        io.load(LoadRequest {
            tab: self.id,
            location,
            encoding: pending.encoding,
            line: pending.line,
            create_if_missing: pending.create_if_missing,
        });
    }

    /// Record a progress report and show or update the progress notice.
    pub(crate) fn report_progress(
        &mut self,
        kind: ProgressKind,
        done: u64,
        total: u64,
        now: Instant,
    ) {
        let started = *self.progress_started.get_or_insert(now);
        let fraction = progress_fraction(done, total);

        if let Some(Notice::Progress {
            fraction: current, ..
        }) = &mut self.notice
        {
            *current = fraction;
            self.events.push(TabEvent::NoticeChanged);
            return;
        }
        if self.notice.is_some() || done == 0 {
            return;
        }

        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let projected = elapsed * total as f64 / done as f64;
        if projected - elapsed > PROGRESS_NOTICE_THRESHOLD_SECS {
            let text = self.progress_text(kind);
            self.set_notice(Some(Notice::Progress {
                kind,
                text,
                fraction,
                cancellable: matches!(kind, ProgressKind::Loading | ProgressKind::Reverting),
            }));
        }
    }

    /// Drop the progress notice and timing of a finished operation.
    pub(crate) fn end_progress(&mut self) {
        self.progress_started = None;
        if self.notice.as_ref().is_some_and(Notice::is_progress) {
            self.set_notice(None);
        }
    }

    pub(crate) fn progress_text(&self, kind: ProgressKind) -> String {
        let location = match kind {
            ProgressKind::Saving => self.pending_save_location(),
            _ => self.document.location(),
        };
        let (name, dir) = match location {
            Some(location) => (location.display_name(), location.parent_display()),
            None => (self.document.short_name(), String::new()),
        };
        let name = middle_truncate(&name, MAX_MESSAGE_LENGTH);
        let dir = middle_truncate(&dir, MAX_MESSAGE_LENGTH);
        match kind {
            ProgressKind::Loading => format!("Loading {} from {}", name, dir),
            ProgressKind::Reverting => format!("Reverting {} from {}", name, dir),
            ProgressKind::Saving => format!("Saving {} to {}", name, dir),
            ProgressKind::Printing => format!("Preparing {}", name),
        }
    }
}

impl std::fmt::Debug for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("location", &self.document.location())
            .field("modified", &self.document.is_modified())
            .field("auto_save_timer", &self.auto_save_timer)
            .finish_non_exhaustive()
    }
}

/// Fraction of work done; `None` pulses when the total is unknown.
pub(crate) fn progress_fraction(done: u64, total: u64) -> Option<f64> {
    if total == 0 {
        if done == 0 {
            Some(0.0)
        } else {
            None
        }
    } else {
        Some((done as f64 / total as f64).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use quire_document::MemoryDocumentIo;

    #[test]
    fn test_new_tab_is_normal_untitled_and_not_armed() {
        let tab = Tab::new(auto_save_settings());
        assert_eq!(tab.state(), TabState::Normal);
        assert!(tab.document().is_untitled());
        assert!(tab.auto_save_timer().is_none());
        assert!(tab.can_close());
    }

    #[test]
    fn test_settings_respect_save_lockdown() {
        let mut editor = EditorSettings::default();
        editor.auto_save = true;
        editor.auto_save_interval = 0;

        let settings = TabSettings::from_config(&editor, Lockdown::empty());
        assert!(settings.auto_save);
        assert_eq!(settings.auto_save_interval, 10);

        let settings = TabSettings::from_config(&editor, Lockdown::SAVE_TO_DISK);
        assert!(!settings.auto_save);
    }

    #[test]
    fn test_name_marks_modified_and_truncates() {
        let (mut io, location) = io_with_file(&"n".repeat(60), "x");
        let mut tab = loaded_tab(&mut io, &location, auto_save_settings());
        assert_eq!(tab.name().chars().count(), MAX_NAME_LENGTH);
        assert!(!tab.name().starts_with('*'));

        tab.set_text("y").unwrap();
        assert!(tab.name().starts_with('*'));
    }

    #[test]
    fn test_tooltip_reflects_error_state() {
        let mut io = MemoryDocumentIo::new();
        let location = Location::parse("/memory/missing.txt").unwrap();
        let mut tab = Tab::new_from_location(TabSettings::default(), &mut io, location, None, 0, false);
        deliver(&mut tab, &mut io);

        assert_eq!(tab.state(), TabState::LoadingError);
        assert!(tab.tooltip().starts_with("Error opening file"));
    }

    #[test]
    fn test_can_close_rules() {
        let (mut io, location) = io_with_file("close.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());
        assert!(tab.can_close());

        tab.set_text("changed").unwrap();
        assert!(!tab.can_close());
        assert!(tab.mark_for_closing(&mut io).is_err());
        assert_eq!(tab.state(), TabState::Normal);

        tab.begin_close(&mut io).unwrap();
        assert_eq!(tab.state(), TabState::Closing);
    }

    #[test]
    fn test_loading_tab_can_close_and_cancels_load() {
        let mut io = MemoryDocumentIo::manual();
        let location = Location::parse("/memory/slow.txt").unwrap();
        let mut tab = Tab::new_from_location(TabSettings::default(), &mut io, location, None, 0, false);

        assert!(tab.can_close());
        tab.mark_for_closing(&mut io).unwrap();
        assert_eq!(tab.state(), TabState::Closing);
        assert!(matches!(
            io.last_request(),
            Some(quire_document::IoRequest::Cancel(id)) if *id == tab.id()
        ));
    }

    #[test]
    fn test_deleted_document_cannot_close_silently() {
        let (mut io, location) = io_with_file("gone.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());
        io.remove_file(&location);

        assert!(!tab.check_externally_modified(&io));
        assert!(tab.document().is_deleted());
        assert!(!tab.can_close());
    }

    #[test]
    fn test_read_only_document_rejects_edits() {
        let (mut io, location) = io_with_file("ro.txt", "x");
        io.set_readonly(&location, true);
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());

        assert!(tab.set_text("y").is_err());
        tab.set_readonly(false);
        assert!(tab.set_text("y").is_ok());
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress_fraction(0, 0), Some(0.0));
        assert_eq!(progress_fraction(10, 0), None);
        assert_eq!(progress_fraction(5, 10), Some(0.5));
    }
}
