//! Loading and reverting.

use std::time::Instant;

use anyhow::Result;

use quire_core::{
    Encoding, IoFailure, LoadErrorClass, Location, Notice, ProgressKind, TabEvent, TabState,
};
use quire_document::{DocumentIo, LoadOutcome, LoadedContent};

use crate::tab::{PendingLoad, Tab};

impl Tab {
    /// Load `location` into this empty untitled tab.
    pub fn load(
        &mut self,
        io: &mut dyn DocumentIo,
        location: Location,
        encoding: Option<Encoding>,
        line: usize,
        create_if_missing: bool,
    ) -> Result<()> {
        if self.state != TabState::Normal {
            return self.reject("load");
        }
        if !self.document.is_untitled() || self.document.is_modified() {
            return self.reject("load into a non-empty tab");
        }
        self.start_load(
            io,
            TabState::Loading,
            location,
            PendingLoad {
                encoding,
                line,
                create_if_missing,
            },
        );
        Ok(())
    }

    /// Reload the document from its location, discarding edits.
    pub fn revert(&mut self, io: &mut dyn DocumentIo) -> Result<()> {
        if !matches!(
            self.state,
            TabState::Normal | TabState::ExternallyModifiedNotification
        ) {
            return self.reject("revert");
        }
        let Some(location) = self.document.location().cloned() else {
            return self.reject("revert an untitled document");
        };
        self.start_load(
            io,
            TabState::Reverting,
            location,
            PendingLoad {
                encoding: Some(self.document.encoding()),
                line: 0,
                create_if_missing: false,
            },
        );
        Ok(())
    }

    /// Ask the backend to stop the load in flight. The outcome still
    /// arrives, as a cancellation.
    pub fn cancel_load(&mut self, io: &mut dyn DocumentIo) -> Result<()> {
        if !self.state.is_loading() {
            return self.reject("cancel a load");
        }
        log::info!("{}: cancelling {}", self.id, self.state);
        io.load_cancel(self.id);
        Ok(())
    }

    pub fn on_load_progress(&mut self, done: u64, total: u64, now: Instant) {
        let kind = match self.state {
            TabState::Loading => ProgressKind::Loading,
            TabState::Reverting => ProgressKind::Reverting,
            _ => return,
        };
        self.report_progress(kind, done, total, now);
    }

    /// Terminal callback of a load or revert.
    ///
    /// `already_open` tells whether another tab shows the same location.
    pub fn on_loaded(&mut self, outcome: LoadOutcome, already_open: bool) -> Result<()> {
        if self.state == TabState::Closing {
            log::debug!("{}: load finished after close, ignored", self.id);
            return Ok(());
        }
        if !self.state.is_loading() {
            return self.reject("finish a load");
        }
        let Some(location) = self.document.location().cloned() else {
            return self.reject("finish a load without location");
        };
        let reverting = self.state == TabState::Reverting;
        self.end_progress();

        match outcome {
            LoadOutcome::Loaded(content) => {
                self.finish_load(location, content, None, already_open);
            }
            LoadOutcome::Degraded(content, failure) if !reverting => {
                self.finish_load(location, content, Some(failure), already_open);
            }
            LoadOutcome::Degraded(content, failure) => {
                log::warn!("{}: reverted {} lossily: {}", self.id, location, failure);
                self.document.apply_loaded(location.clone(), content);
                self.document.set_readonly(true);
                self.pending_load = None;
                self.set_notice(Some(Notice::RevertingError {
                    location,
                    kind: failure.kind,
                    message: failure.message,
                }));
                self.set_state(TabState::RevertingError);
            }
            LoadOutcome::Failed(failure) => self.fail_load(location, failure, reverting),
        }
        Ok(())
    }

    fn finish_load(
        &mut self,
        location: Location,
        content: LoadedContent,
        fallback: Option<IoFailure>,
        already_open: bool,
    ) {
        log::info!("{}: loaded {}", self.id, location);
        self.document.apply_loaded(location.clone(), content);
        self.events.push(TabEvent::RecentAdded(location.clone()));
        self.ask_if_externally_modified = true;
        self.pending_load = None;

        if let Some(failure) = fallback {
            log::warn!("{}: {} loaded with fallback: {}", self.id, location, failure);
            self.document.set_readonly(true);
            self.set_notice(Some(Notice::LoadingError {
                location: location.clone(),
                kind: failure.kind,
                message: failure.message,
                fallback: true,
            }));
        }
        if already_open {
            self.not_editable = true;
            self.set_notice(Some(Notice::FileAlreadyOpen { location }));
        }
        self.set_state(TabState::Normal);
    }

    /// A cancelled load closes the tab; a cancelled revert keeps the
    /// current buffer and returns to `Normal`.
    fn fail_load(&mut self, location: Location, failure: IoFailure, reverting: bool) {
        match (failure.kind.classify_load(), reverting) {
            (LoadErrorClass::Cancelled, false) => {
                log::info!("{}: loading {} cancelled", self.id, location);
                self.pending_load = None;
                self.events.push(TabEvent::CloseRequested);
            }
            (LoadErrorClass::Cancelled, true) => {
                log::info!("{}: reverting {} cancelled", self.id, location);
                self.pending_load = None;
                self.set_state(TabState::Normal);
            }
            (_, true) => {
                log::warn!("{}: reverting {} failed: {}", self.id, location, failure);
                self.pending_load = None;
                self.set_notice(Some(Notice::RevertingError {
                    location,
                    kind: failure.kind,
                    message: failure.message,
                }));
                self.set_state(TabState::RevertingError);
            }
            (_, false) => {
                log::warn!("{}: loading {} failed: {}", self.id, location, failure);
                self.events.push(TabEvent::RecentRemoved(location.clone()));
                self.set_notice(Some(Notice::LoadingError {
                    location,
                    kind: failure.kind,
                    message: failure.message,
                    fallback: false,
                }));
                self.set_state(TabState::LoadingError);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_support::*;
    use crate::TabSettings;
    use quire_core::{IoErrorKind, NoticeResponse};
    use quire_document::{IoMessage, IoRequest, MemoryDocumentIo};

    #[test]
    fn test_load_from_location_reaches_normal() {
        let (mut io, location) = io_with_file("doc.txt", "line one\nline two\n");
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location.clone(), None, 1, false);
        assert_eq!(tab.state(), TabState::Loading);

        deliver(&mut tab, &mut io);
        assert_eq!(tab.state(), TabState::Normal);
        assert_eq!(tab.document().text(), "line one\nline two\n");
        assert_eq!(tab.document().cursor_line(), 1);
        assert!(tab.ask_if_externally_modified());
        assert!(tab
            .take_events()
            .contains(&TabEvent::RecentAdded(location)));
    }

    #[test]
    fn test_load_into_empty_tab() {
        let (mut io, location) = io_with_file("later.txt", "content");
        let mut tab = Tab::new(TabSettings::default());
        tab.load(&mut io, location, None, 0, false).unwrap();
        assert_eq!(tab.state(), TabState::Loading);
        deliver(&mut tab, &mut io);
        assert_eq!(tab.document().text(), "content");
    }

    #[test]
    fn test_load_rejected_while_busy() {
        let mut io = MemoryDocumentIo::manual();
        let location = Location::parse("/memory/busy.txt").unwrap();
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location.clone(), None, 0, false);

        assert!(tab.load(&mut io, location, None, 0, false).is_err());
        assert!(tab.save(&mut io).is_err());
        assert_eq!(tab.state(), TabState::Loading);
        assert_eq!(io.requests().len(), 1);
    }

    #[test]
    fn test_create_if_missing() {
        let mut io = MemoryDocumentIo::new();
        let location = Location::parse("/memory/new.txt").unwrap();
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location, None, 0, true);
        deliver(&mut tab, &mut io);
        assert_eq!(tab.state(), TabState::Normal);
        assert_eq!(tab.document().text(), "");
    }

    #[test]
    fn test_hard_error_enters_loading_error() {
        let mut io = MemoryDocumentIo::new();
        let location = Location::parse("/memory/missing.txt").unwrap();
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location.clone(), None, 0, false);
        deliver(&mut tab, &mut io);

        assert_eq!(tab.state(), TabState::LoadingError);
        assert!(matches!(
            tab.notice(),
            Some(Notice::LoadingError { kind: IoErrorKind::NotFound, fallback: false, .. })
        ));
        assert!(tab.take_events().contains(&TabEvent::RecentRemoved(location)));
    }

    #[test]
    fn test_cancelled_load_requests_close_without_error_state() {
        let mut io = MemoryDocumentIo::manual();
        let location = Location::parse("/memory/cancel.txt").unwrap();
        io.write_file(&location, "x");
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location, None, 0, false);

        tab.cancel_load(&mut io).unwrap();
        io.complete_pending();
        deliver(&mut tab, &mut io);

        assert_eq!(tab.state(), TabState::Loading);
        assert!(tab.take_events().contains(&TabEvent::CloseRequested));
    }

    #[test]
    fn test_fallback_load_is_read_only_normal() {
        let (mut io, location) = io_with_file("latin.txt", "caf\u{fffd}");
        io.fail_next_load(IoFailure::new(IoErrorKind::ConversionFallback, "invalid UTF-8"));
        let mut tab =
            Tab::new_from_location(auto_save_settings(), &mut io, location, None, 0, false);
        deliver(&mut tab, &mut io);

        assert_eq!(tab.state(), TabState::Normal);
        assert!(tab.document().is_readonly());
        assert!(tab.auto_save_timer().is_none());
        assert!(matches!(
            tab.notice(),
            Some(Notice::LoadingError { fallback: true, .. })
        ));

        tab.respond(&mut io, NoticeResponse::EditAnyway).unwrap();
        assert!(!tab.document().is_readonly());
        assert!(tab.notice().is_none());
        assert!(tab.auto_save_timer().is_some());
    }

    #[test]
    fn test_already_open_marks_not_editable() {
        let (mut io, location) = io_with_file("twice.txt", "x");
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location, None, 0, false);
        for message in io.poll_messages() {
            if let IoMessage::Loaded { outcome, .. } = message {
                tab.on_loaded(outcome, true).unwrap();
            }
        }

        assert!(tab.is_not_editable());
        assert!(matches!(tab.notice(), Some(Notice::FileAlreadyOpen { .. })));
        assert!(tab.set_text("y").is_err());

        tab.respond(&mut io, NoticeResponse::EditAnyway).unwrap();
        assert!(!tab.is_not_editable());
        assert!(tab.set_text("y").is_ok());
    }

    #[test]
    fn test_revert_discards_edits() {
        let (mut io, location) = io_with_file("revert.txt", "original");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());
        tab.set_text("scratch").unwrap();

        tab.revert(&mut io).unwrap();
        assert_eq!(tab.state(), TabState::Reverting);
        assert!(matches!(
            io.last_request(),
            Some(IoRequest::Load(request)) if request.line == 0 && request.encoding.is_some()
        ));

        deliver(&mut tab, &mut io);
        assert_eq!(tab.state(), TabState::Normal);
        assert_eq!(tab.document().text(), "original");
        assert!(!tab.document().is_modified());
    }

    #[test]
    fn test_failed_revert_is_dismissed_to_normal() {
        let (mut io, location) = io_with_file("revert-fail.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());
        io.remove_file(&location);

        tab.revert(&mut io).unwrap();
        deliver(&mut tab, &mut io);
        assert_eq!(tab.state(), TabState::RevertingError);
        assert!(tab.respond(&mut io, NoticeResponse::Close).is_err());

        tab.respond(&mut io, NoticeResponse::Dismiss).unwrap();
        assert_eq!(tab.state(), TabState::Normal);
        assert!(tab.notice().is_none());
    }

    #[test]
    fn test_cancelled_revert_returns_to_normal() {
        let mut io = MemoryDocumentIo::manual();
        let location = Location::parse("/memory/revert-cancel.txt").unwrap();
        io.write_file(&location, "x");
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location, None, 0, false);
        io.complete_pending();
        deliver(&mut tab, &mut io);

        tab.revert(&mut io).unwrap();
        tab.cancel_load(&mut io).unwrap();
        io.complete_pending();
        deliver(&mut tab, &mut io);
        assert_eq!(tab.state(), TabState::Normal);
        assert!(!tab.take_events().contains(&TabEvent::CloseRequested));
    }

    #[test]
    fn test_slow_load_shows_progress_notice() {
        let mut io = MemoryDocumentIo::manual();
        let location = Location::parse("/memory/slow.txt").unwrap();
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location, None, 0, false);

        let start = Instant::now();
        tab.on_load_progress(0, 1000, start);
        assert!(tab.notice().is_none());

        // 10% after one second projects nine more seconds.
        tab.on_load_progress(100, 1000, start + Duration::from_secs(1));
        match tab.notice() {
            Some(Notice::Progress {
                text,
                fraction,
                cancellable,
                ..
            }) => {
                assert!(text.starts_with("Loading slow.txt from "));
                assert_eq!(*fraction, Some(0.1));
                assert!(cancellable);
            }
            other => panic!("unexpected notice {:?}", other),
        }

        tab.on_load_progress(500, 1000, start + Duration::from_secs(2));
        assert!(matches!(
            tab.notice(),
            Some(Notice::Progress { fraction: Some(f), .. }) if (*f - 0.5).abs() < f64::EPSILON
        ));

        tab.respond(&mut io, NoticeResponse::Cancel).unwrap();
        assert!(matches!(io.last_request(), Some(IoRequest::Cancel(_))));
    }

    #[test]
    fn test_fast_load_shows_no_progress_notice() {
        let mut io = MemoryDocumentIo::manual();
        let location = Location::parse("/memory/fast.txt").unwrap();
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location, None, 0, false);

        let start = Instant::now();
        tab.on_load_progress(0, 1000, start);
        tab.on_load_progress(900, 1000, start + Duration::from_millis(100));
        assert!(tab.notice().is_none());
    }

    #[test]
    fn test_retry_with_encoding_after_hard_error() {
        let mut io = MemoryDocumentIo::new();
        let location = Location::parse("/memory/retry.txt").unwrap();
        io.write_file(&location, "x");
        io.fail_next_load(IoFailure::new(IoErrorKind::InvalidData, "bad bytes"));
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location, None, 4, false);
        deliver(&mut tab, &mut io);
        assert_eq!(tab.state(), TabState::LoadingError);

        tab.respond(
            &mut io,
            NoticeResponse::Retry {
                encoding: Encoding::Latin1,
            },
        )
        .unwrap();
        assert_eq!(tab.state(), TabState::Loading);
        assert!(matches!(
            io.last_request(),
            Some(IoRequest::Load(request))
                if request.encoding == Some(Encoding::Latin1) && request.line == 4
        ));

        deliver(&mut tab, &mut io);
        assert_eq!(tab.state(), TabState::Normal);
        assert_eq!(tab.document().encoding(), Encoding::Latin1);
    }

    #[test]
    fn test_hard_load_error_keeps_error_state() {
        let (mut io, location) = io_with_file("guarded.txt", "precious original");
        io.fail_next_load(IoFailure::new(IoErrorKind::PermissionDenied, "denied"));
        let mut tab =
            Tab::new_from_location(auto_save_settings(), &mut io, location.clone(), None, 0, false);
        deliver(&mut tab, &mut io);
        assert_eq!(tab.state(), TabState::LoadingError);

        assert!(tab.respond(&mut io, NoticeResponse::EditAnyway).is_err());
        assert!(tab.respond(&mut io, NoticeResponse::DontEdit).is_err());
        assert_eq!(tab.state(), TabState::LoadingError);
        assert!(matches!(
            tab.notice(),
            Some(Notice::LoadingError { fallback: false, .. })
        ));

        assert!(tab.set_text("oops").is_err());
        assert!(tab.save(&mut io).is_err());
        assert!(tab.auto_save_timer().is_none());
        assert_eq!(tab.state(), TabState::LoadingError);
        assert_eq!(io.file_text(&location), Some("precious original"));
        assert!(tab.can_close());
    }

    #[test]
    fn test_dont_edit_after_fallback_keeps_read_only() {
        let (mut io, location) = io_with_file("lossy.txt", "caf\u{fffd}");
        io.fail_next_load(IoFailure::new(IoErrorKind::ConversionFallback, "invalid UTF-8"));
        let mut tab =
            Tab::new_from_location(auto_save_settings(), &mut io, location, None, 0, false);
        deliver(&mut tab, &mut io);

        tab.respond(&mut io, NoticeResponse::DontEdit).unwrap();
        assert_eq!(tab.state(), TabState::Normal);
        assert!(tab.notice().is_none());
        assert!(tab.document().is_readonly());
        assert!(tab.auto_save_timer().is_none());
    }

    #[test]
    fn test_close_response_requests_close() {
        let mut io = MemoryDocumentIo::new();
        let location = Location::parse("/memory/close-me.txt").unwrap();
        let mut tab =
            Tab::new_from_location(TabSettings::default(), &mut io, location.clone(), None, 0, false);
        deliver(&mut tab, &mut io);
        tab.take_events();

        tab.respond(&mut io, NoticeResponse::Close).unwrap();
        let events = tab.take_events();
        assert!(events.contains(&TabEvent::RecentRemoved(location)));
        assert!(events.contains(&TabEvent::CloseRequested));
        assert!(tab.can_close());
    }
}
