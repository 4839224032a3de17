//! Printing and print preview.

use anyhow::Result;

use quire_core::{Notice, ProgressKind, TabEvent, TabState};
use quire_print::{PreviewHandle, PrintAction, PrintDefaults, PrintJob, PrintJobResult};

use crate::tab::Tab;

impl Tab {
    /// Start `job` with this document's print configuration, or with copies
    /// of the defaults when the document was never printed.
    ///
    /// A job that fails to start leaves the tab in `Normal`.
    pub fn print(
        &mut self,
        mut job: Box<dyn PrintJob>,
        action: PrintAction,
        defaults: &mut PrintDefaults,
    ) -> Result<()> {
        match self.state {
            TabState::Normal if self.print_job.is_some() => {
                return self.reject("start a second print job")
            }
            TabState::Normal => {}
            TabState::ShowingPrintPreview => self.close_print_preview()?,
            _ => return self.reject("print"),
        }

        let page_setup = self
            .page_setup
            .clone()
            .unwrap_or_else(|| defaults.page_setup());
        let settings = self
            .print_settings
            .clone()
            .unwrap_or_else(|| defaults.print_settings());

        if let Err(err) = job.print(action, &page_setup, &settings) {
            log::warn!("{}: print job did not start: {:#}", self.id, err);
            return Ok(());
        }

        self.print_job = Some(job);
        let text = self.progress_text(ProgressKind::Printing);
        self.set_notice(Some(Notice::Progress {
            kind: ProgressKind::Printing,
            text,
            fraction: Some(0.0),
            cancellable: true,
        }));
        self.set_state(match action {
            PrintAction::Print => TabState::Printing,
            PrintAction::Preview => TabState::PrintPreviewing,
        });
        Ok(())
    }

    /// Status update from the running job.
    pub fn on_print_progress(&mut self, status: &str, fraction: Option<f64>) {
        if !matches!(self.state, TabState::Printing | TabState::PrintPreviewing) {
            return;
        }
        if let Some(Notice::Progress {
            kind: ProgressKind::Printing,
            text,
            fraction: current,
            ..
        }) = &mut self.notice
        {
            *text = status.to_string();
            *current = fraction;
            self.events.push(TabEvent::NoticeChanged);
        }
    }

    /// The preview is rendered and replaces the text view.
    pub fn on_show_preview(&mut self, preview: PreviewHandle) -> Result<()> {
        if self.state != TabState::PrintPreviewing {
            return self.reject("show a print preview");
        }
        self.set_notice(None);
        self.print_preview = Some(preview);
        self.set_state(TabState::ShowingPrintPreview);
        Ok(())
    }

    /// Terminal callback of the print job.
    pub fn on_print_done(&mut self, result: PrintJobResult) -> Result<()> {
        if self.print_job.is_none() {
            return self.reject("finish a print job that was never started");
        }
        self.finish_print(result);
        Ok(())
    }

    /// Close the preview without printing.
    pub fn close_print_preview(&mut self) -> Result<()> {
        if self.print_preview.is_none() {
            return self.reject("close a print preview");
        }
        if let Some(job) = self.print_job.as_mut() {
            job.cancel();
        }
        self.finish_print(PrintJobResult::Cancelled);
        Ok(())
    }

    fn finish_print(&mut self, result: PrintJobResult) {
        let job = self.print_job.take();
        self.print_preview = None;
        if matches!(
            self.notice,
            Some(Notice::Progress {
                kind: ProgressKind::Printing,
                ..
            })
        ) {
            self.set_notice(None);
        }

        match result {
            PrintJobResult::Applied => {
                if let Some(job) = job {
                    self.page_setup = Some(job.page_setup());
                    self.print_settings = Some(job.print_settings().without_copies());
                    self.events.push(TabEvent::PrintSettingsUsed);
                }
            }
            PrintJobResult::Cancelled => log::debug!("{}: print job cancelled", self.id),
            PrintJobResult::Failed(message) => {
                log::warn!("{}: print job failed: {}", self.id, message)
            }
        }

        if self.state.is_printing() {
            self.set_state(TabState::Normal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::TabSettings;
    use quire_core::NoticeResponse;
    use quire_print::{Orientation, PrintSettings};

    fn defaults() -> (tempfile::TempDir, PrintDefaults) {
        let dir = tempfile::tempdir().unwrap();
        let defaults = PrintDefaults::new(dir.path().to_path_buf());
        (dir, defaults)
    }

    #[test]
    fn test_print_uses_defaults_then_remembers_settings() {
        let (_dir, mut defaults) = defaults();
        let (mut io, location) = io_with_file("print.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());

        let job = FakePrintJob::new();
        let state = job.state();
        {
            let mut state = state.borrow_mut();
            state.page_setup.orientation = Orientation::Landscape;
            state.settings.set_n_copies(3);
            state.settings.set(PrintSettings::PRINTER, "office");
        }
        tab.print(Box::new(job), PrintAction::Print, &mut defaults)
            .unwrap();
        assert_eq!(tab.state(), TabState::Printing);
        assert_eq!(state.borrow().started, Some(PrintAction::Print));
        assert!(matches!(
            tab.notice(),
            Some(Notice::Progress { kind: ProgressKind::Printing, .. })
        ));

        tab.on_print_progress("Rendering page 1", Some(0.5));
        assert!(matches!(
            tab.notice(),
            Some(Notice::Progress { text, .. }) if text == "Rendering page 1"
        ));

        tab.take_events();
        tab.on_print_done(PrintJobResult::Applied).unwrap();
        assert_eq!(tab.state(), TabState::Normal);
        assert!(tab.notice().is_none());
        assert!(tab.take_events().contains(&TabEvent::PrintSettingsUsed));
        assert_eq!(
            tab.page_setup().map(|s| s.orientation),
            Some(Orientation::Landscape)
        );
        let remembered = tab.print_settings().unwrap();
        assert_eq!(remembered.get(PrintSettings::PRINTER), Some("office"));
        assert_eq!(remembered.n_copies(), None);

        // The next job starts from the document's own settings.
        let job = FakePrintJob::new();
        let state = job.state();
        tab.print(Box::new(job), PrintAction::Print, &mut defaults)
            .unwrap();
        assert_eq!(
            state.borrow().received_page_setup.as_ref().map(|s| s.orientation),
            Some(Orientation::Landscape)
        );
    }

    #[test]
    fn test_preview_flow() {
        let (_dir, mut defaults) = defaults();
        let (mut io, location) = io_with_file("preview.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, auto_save_settings());

        tab.print(Box::new(FakePrintJob::new()), PrintAction::Preview, &mut defaults)
            .unwrap();
        assert_eq!(tab.state(), TabState::PrintPreviewing);
        assert!(tab.auto_save_timer().is_none());

        tab.on_show_preview(PreviewHandle(7)).unwrap();
        assert_eq!(tab.state(), TabState::ShowingPrintPreview);
        assert_eq!(tab.print_preview(), Some(PreviewHandle(7)));
        assert!(tab.notice().is_none());
        assert!(tab.auto_save_timer().is_some());

        tab.close_print_preview().unwrap();
        assert_eq!(tab.state(), TabState::Normal);
        assert!(!tab.has_print_job());
        assert!(tab.page_setup().is_none());
    }

    #[test]
    fn test_save_while_showing_preview_returns_to_preview() {
        let (_dir, mut defaults) = defaults();
        let (mut io, location) = io_with_file("preview-save.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());
        tab.set_text("y").unwrap();
        tab.print(Box::new(FakePrintJob::new()), PrintAction::Preview, &mut defaults)
            .unwrap();
        tab.on_show_preview(PreviewHandle(1)).unwrap();

        tab.save(&mut io).unwrap();
        assert_eq!(tab.state(), TabState::Saving);
        deliver(&mut tab, &mut io);
        assert_eq!(tab.state(), TabState::ShowingPrintPreview);
    }

    #[test]
    fn test_second_print_job_is_rejected() {
        let (_dir, mut defaults) = defaults();
        let (mut io, location) = io_with_file("busy-print.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());

        tab.print(Box::new(FakePrintJob::new()), PrintAction::Print, &mut defaults)
            .unwrap();
        let second = FakePrintJob::new();
        let state = second.state();
        assert!(tab
            .print(Box::new(second), PrintAction::Print, &mut defaults)
            .is_err());
        assert!(state.borrow().started.is_none());
        assert!(tab.save(&mut io).is_err());
    }

    #[test]
    fn test_printing_from_preview_replaces_preview() {
        let (_dir, mut defaults) = defaults();
        let (mut io, location) = io_with_file("replace.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());
        tab.print(Box::new(FakePrintJob::new()), PrintAction::Preview, &mut defaults)
            .unwrap();
        tab.on_show_preview(PreviewHandle(2)).unwrap();

        tab.print(Box::new(FakePrintJob::new()), PrintAction::Print, &mut defaults)
            .unwrap();
        assert_eq!(tab.state(), TabState::Printing);
        assert!(tab.print_preview().is_none());
    }

    #[test]
    fn test_job_that_fails_to_start_stays_normal() {
        let (_dir, mut defaults) = defaults();
        let (mut io, location) = io_with_file("nostart.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());

        let job = FakePrintJob::failing();
        tab.print(Box::new(job), PrintAction::Print, &mut defaults)
            .unwrap();
        assert_eq!(tab.state(), TabState::Normal);
        assert!(!tab.has_print_job());
        assert!(tab.notice().is_none());
    }

    #[test]
    fn test_cancel_from_progress_notice_cancels_job() {
        let (_dir, mut defaults) = defaults();
        let (mut io, location) = io_with_file("cancel-print.txt", "x");
        let mut tab = loaded_tab(&mut io, &location, TabSettings::default());
        let job = FakePrintJob::new();
        let state = job.state();
        tab.print(Box::new(job), PrintAction::Print, &mut defaults)
            .unwrap();

        tab.respond(&mut io, NoticeResponse::Cancel).unwrap();
        assert!(state.borrow().cancelled);
        assert_eq!(tab.state(), TabState::Printing);

        tab.on_print_done(PrintJobResult::Cancelled).unwrap();
        assert_eq!(tab.state(), TabState::Normal);
        assert!(tab.print_settings().is_none());
    }
}
