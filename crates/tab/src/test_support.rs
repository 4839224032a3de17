//! Helpers shared by the tab tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{bail, Result};

use quire_core::Location;
use quire_document::{IoMessage, MemoryDocumentIo};
use quire_print::{PageSetup, PrintAction, PrintJob, PrintSettings};

use crate::{Tab, TabSettings};

pub fn auto_save_settings() -> TabSettings {
    TabSettings {
        auto_save: true,
        auto_save_interval: 10,
    }
}

/// Backend holding one file at `/memory/<name>`.
pub fn io_with_file(name: &str, text: &str) -> (MemoryDocumentIo, Location) {
    let mut io = MemoryDocumentIo::new();
    let location = Location::parse(&format!("/memory/{}", name)).unwrap();
    io.write_file(&location, text);
    (io, location)
}

/// Feed every pending backend message to `tab`.
pub fn deliver(tab: &mut Tab, io: &mut MemoryDocumentIo) {
    let now = Instant::now();
    for message in quire_document::DocumentIo::poll_messages(io) {
        match message {
            IoMessage::LoadProgress { done, total, .. } => tab.on_load_progress(done, total, now),
            IoMessage::Loaded { outcome, .. } => tab.on_loaded(outcome, false).unwrap(),
            IoMessage::SaveProgress { done, total, .. } => tab.on_save_progress(done, total, now),
            IoMessage::Saved { result, .. } => tab.on_saved(result).unwrap(),
        }
    }
}

/// Tab that finished loading `location`, with its events drained.
pub fn loaded_tab(io: &mut MemoryDocumentIo, location: &Location, settings: TabSettings) -> Tab {
    let mut tab = Tab::new_from_location(settings, io, location.clone(), None, 0, false);
    deliver(&mut tab, io);
    assert_eq!(tab.state(), quire_core::TabState::Normal);
    tab.take_events();
    tab
}

#[derive(Debug, Default)]
pub struct FakeJobState {
    pub fail_start: bool,
    pub started: Option<PrintAction>,
    pub cancelled: bool,
    pub received_page_setup: Option<PageSetup>,
    /// What the job reports back, as if edited in a print dialog.
    pub page_setup: PageSetup,
    pub settings: PrintSettings,
}

/// Print job whose state stays observable after it is boxed.
pub struct FakePrintJob {
    state: Rc<RefCell<FakeJobState>>,
}

impl FakePrintJob {
    pub fn new() -> Self {
        Self {
            state: Rc::default(),
        }
    }

    pub fn failing() -> Self {
        let job = Self::new();
        job.state.borrow_mut().fail_start = true;
        job
    }

    pub fn state(&self) -> Rc<RefCell<FakeJobState>> {
        Rc::clone(&self.state)
    }
}

impl PrintJob for FakePrintJob {
    fn print(
        &mut self,
        action: PrintAction,
        page_setup: &PageSetup,
        _settings: &PrintSettings,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_start {
            bail!("no printer available");
        }
        state.started = Some(action);
        state.received_page_setup = Some(page_setup.clone());
        Ok(())
    }

    fn cancel(&mut self) {
        self.state.borrow_mut().cancelled = true;
    }

    fn page_setup(&self) -> PageSetup {
        self.state.borrow().page_setup.clone()
    }

    fn print_settings(&self) -> PrintSettings {
        self.state.borrow().settings.clone()
    }
}
