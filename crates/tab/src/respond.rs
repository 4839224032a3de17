//! Answers to notices.

use anyhow::Result;

use quire_core::{
    Notice, NoticeResponse, ProgressKind, SaveErrorClass, SaveFlags, TabEvent, TabState,
};
use quire_document::DocumentIo;

use crate::tab::{PendingLoad, PendingSave, SaveKind, Tab};

impl Tab {
    /// Route the presentation layer's answer to the current notice.
    ///
    /// Fails if no notice is showing or the notice does not offer `response`.
    pub fn respond(&mut self, io: &mut dyn DocumentIo, response: NoticeResponse) -> Result<()> {
        let Some(notice) = self.notice.clone() else {
            return self.reject("respond without a notice");
        };
        if !notice.accepts(response) {
            return self.reject(&format!("answer {:?}", response));
        }
        log::debug!("{}: notice answered with {:?}", self.id, response);

        match notice {
            Notice::Progress { kind, .. } => self.cancel_progress(io, kind),
            Notice::LoadingError { location, .. } => {
                self.respond_loading_error(io, location, response)
            }
            Notice::RevertingError { .. } => {
                self.set_notice(None);
                self.set_state(TabState::Normal);
                Ok(())
            }
            Notice::SavingError { class, .. } => self.respond_saving_error(io, class, response),
            Notice::ExternallyModified { .. } => {
                if response == NoticeResponse::Reload {
                    return self.revert(io);
                }
                self.ask_if_externally_modified = false;
                self.set_notice(None);
                self.set_state(TabState::Normal);
                Ok(())
            }
            Notice::FileAlreadyOpen { .. } => {
                if response == NoticeResponse::EditAnyway {
                    self.not_editable = false;
                }
                self.set_notice(None);
                Ok(())
            }
        }
    }

    fn cancel_progress(&mut self, io: &mut dyn DocumentIo, kind: ProgressKind) -> Result<()> {
        match kind {
            ProgressKind::Loading | ProgressKind::Reverting => self.cancel_load(io),
            ProgressKind::Printing => {
                if let Some(job) = self.print_job.as_mut() {
                    job.cancel();
                }
                Ok(())
            }
            ProgressKind::Saving => self.reject("cancel a save"),
        }
    }

    fn respond_loading_error(
        &mut self,
        io: &mut dyn DocumentIo,
        location: quire_core::Location,
        response: NoticeResponse,
    ) -> Result<()> {
        match response {
            NoticeResponse::Retry { encoding } => {
                let pending = self.pending_load.unwrap_or(PendingLoad {
                    encoding: None,
                    line: self.document.cursor_line(),
                    create_if_missing: false,
                });
                self.start_load(
                    io,
                    TabState::Loading,
                    location,
                    PendingLoad {
                        encoding: Some(encoding),
                        ..pending
                    },
                );
            }
            // Only offered after a lossy load, which already left the tab in Normal
            NoticeResponse::EditAnyway | NoticeResponse::DontEdit => {
                self.pending_load = None;
                self.set_notice(None);
                self.set_readonly(response == NoticeResponse::DontEdit);
            }
            _ => {
                self.set_notice(None);
                self.events.push(TabEvent::RecentRemoved(location));
                self.events.push(TabEvent::CloseRequested);
            }
        }
        Ok(())
    }

    fn respond_saving_error(
        &mut self,
        io: &mut dyn DocumentIo,
        class: SaveErrorClass,
        response: NoticeResponse,
    ) -> Result<()> {
        let Some(pending) = self.pending_save.clone() else {
            return self.reject("retry a save that was never started");
        };
        self.set_notice(None);

        match (response, class) {
            (NoticeResponse::SaveAnyway, SaveErrorClass::ExternallyModified) => {
                self.begin_save(
                    io,
                    PendingSave {
                        flags: pending.flags | SaveFlags::IGNORE_MTIME,
                        ..pending
                    },
                );
            }
            (NoticeResponse::SaveAnyway, _) => {
                self.save_flags |= SaveFlags::IGNORE_BACKUP;
                self.begin_save(
                    io,
                    PendingSave {
                        flags: pending.flags | SaveFlags::IGNORE_BACKUP,
                        ..pending
                    },
                );
            }
            (NoticeResponse::Retry { encoding }, _) => {
                self.begin_save(
                    io,
                    PendingSave {
                        encoding,
                        flags: self.save_flags,
                        kind: SaveKind::SaveAs,
                        ..pending
                    },
                );
            }
            _ => {
                self.pending_save = None;
                self.set_state(self.resting_state());
            }
        }
        Ok(())
    }
}
