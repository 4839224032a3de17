//! Saving.

use std::time::Instant;

use anyhow::Result;

use quire_core::{
    Encoding, IoFailure, Location, NewlineType, Notice, ProgressKind, SaveErrorClass, SaveFlags,
    TabEvent, TabState,
};
use quire_document::{DocumentIo, SaveRequest, SavedInfo};

use crate::tab::{PendingSave, SaveKind, Tab};

impl Tab {
    /// Save the document to its current location.
    pub fn save(&mut self, io: &mut dyn DocumentIo) -> Result<()> {
        if !self.state.permits_save() {
            return self.reject("save");
        }
        let Some(location) = self.document.location().cloned() else {
            return self.reject("save an untitled document");
        };

        let mut flags = self.save_flags;
        if self.state == TabState::ExternallyModifiedNotification {
            flags |= SaveFlags::IGNORE_MTIME;
            self.set_notice(None);
        }
        self.begin_save(
            io,
            PendingSave {
                location,
                encoding: self.document.encoding(),
                flags,
                kind: SaveKind::Save,
            },
        );
        Ok(())
    }

    /// Save the document to `location` with the given encoding and newline type.
    pub fn save_as(
        &mut self,
        io: &mut dyn DocumentIo,
        location: Location,
        encoding: Encoding,
        newline: NewlineType,
    ) -> Result<()> {
        if !self.state.permits_save() {
            return self.reject("save as");
        }
        if self.state == TabState::ExternallyModifiedNotification {
            self.set_notice(None);
        }
        self.save_flags = SaveFlags::empty();
        self.document.set_newline(newline);
        self.begin_save(
            io,
            PendingSave {
                location,
                encoding,
                flags: SaveFlags::empty(),
                kind: SaveKind::SaveAs,
            },
        );
        Ok(())
    }

    pub fn on_save_progress(&mut self, done: u64, total: u64, now: Instant) {
        if self.state == TabState::Saving {
            self.report_progress(ProgressKind::Saving, done, total, now);
        }
    }

    /// Terminal callback of a save.
    pub fn on_saved(&mut self, result: Result<SavedInfo, IoFailure>) -> Result<()> {
        if self.state != TabState::Saving {
            return self.reject("finish a save");
        }
        let Some(pending) = self.pending_save.clone() else {
            return self.reject("finish a save that was never started");
        };
        self.end_progress();

        match result {
            Ok(info) => {
                log::info!("{}: saved {}", self.id, pending.location);
                self.document
                    .apply_saved(pending.location.clone(), pending.encoding, info.mtime);
                self.pending_save = None;
                self.ask_if_externally_modified = true;
                self.events.push(TabEvent::RecentAdded(pending.location));
                self.set_state(self.resting_state());
            }
            Err(failure) => {
                let class = failure.kind.classify_save();
                log::warn!(
                    "{}: saving {} failed ({:?}): {}",
                    self.id,
                    pending.location,
                    class,
                    failure
                );
                if class == SaveErrorClass::Unrecoverable {
                    self.events
                        .push(TabEvent::RecentRemoved(pending.location.clone()));
                }
                self.set_notice(Some(Notice::SavingError {
                    location: pending.location,
                    kind: failure.kind,
                    class,
                    message: failure.message,
                }));
                self.set_state(TabState::SavingError);
            }
        }
        Ok(())
    }

    /// Issue a save request and enter `Saving`.
    pub(crate) fn begin_save(&mut self, io: &mut dyn DocumentIo, pending: PendingSave) {
        let request = SaveRequest {
            tab: self.id,
            location: pending.location.clone(),
            encoding: pending.encoding,
            newline: self.document.newline(),
            text: self.document.text().to_string(),
            flags: pending.flags,
            known_mtime: self.document.mtime(),
        };
        let kind = pending.kind;
        log::debug!(
            "{}: saving {} as {} ({:?})",
            self.id,
            pending.location,
            pending.encoding,
            pending.flags
        );
        self.progress_started = None;
        self.pending_save = Some(pending);
        self.set_state(TabState::Saving);
        match kind {
            SaveKind::Save => io.save(request),
            SaveKind::SaveAs => io.save_as(request),
        }
    }

    /// Where a finished or abandoned save returns to.
    pub(crate) fn resting_state(&self) -> TabState {
        if self.print_preview.is_some() {
            TabState::ShowingPrintPreview
        } else {
            TabState::Normal
        }
    }
}
