//! The `App` type.

use std::cell::Cell;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use quire_config::Config;
use quire_core::{
    AppEvent, Encoding, Location, Lockdown, NewlineType, NoticeResponse, TabEvent, TabId,
    WindowEvent, WindowId, WindowState,
};
use quire_document::{Document, DocumentIo, IoMessage};
use quire_print::{PageSetup, PrintAction, PrintDefaults, PrintJob, PrintSettings};
use quire_tab::Tab;
use quire_window::{Viewport, Window};

thread_local! {
    static INSTANCE_ALIVE: Cell<bool> = const { Cell::new(false) };
}

/// Owner of all windows and process-wide settings.
pub struct App {
    config: Config,
    io: Box<dyn DocumentIo>,
    /// Most recently active first.
    windows: Vec<Window>,
    active_window: Option<WindowId>,
    lockdown: Lockdown,
    print_defaults: PrintDefaults,
    events: Vec<AppEvent>,
    window_events: Vec<(WindowId, WindowEvent)>,
}

impl App {
    /// Create the app, keeping print defaults in the user config directory.
    pub fn init(config: Config, io: Box<dyn DocumentIo>) -> Result<Self> {
        let dir = quire_config::get_config_dir()?;
        Self::init_in(config, io, dir)
    }

    /// Create the app with print defaults stored under `config_dir`.
    ///
    /// Fails if an app already exists on this thread.
    pub fn init_in(config: Config, io: Box<dyn DocumentIo>, config_dir: PathBuf) -> Result<Self> {
        if INSTANCE_ALIVE.with(|alive| alive.replace(true)) {
            bail!("The application is already initialized");
        }
        let lockdown = config.lockdown.to_mask();
        log::info!("Application started (lockdown {:?})", lockdown);
        Ok(Self {
            config,
            io,
            windows: Vec::new(),
            active_window: None,
            lockdown,
            print_defaults: PrintDefaults::new(config_dir),
            events: Vec::new(),
            window_events: Vec::new(),
        })
    }

    /// Persist the print defaults and release the instance.
    pub fn shutdown(self) -> Result<()> {
        log::info!("Application shutting down");
        self.print_defaults
            .save()
            .context("Failed to save print defaults")
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn io_mut(&mut self) -> &mut dyn DocumentIo {
        self.io.as_mut()
    }

    // ========================================================================
    // Windows
    // ========================================================================

    /// Open a new empty window on `screen`. The first one becomes active.
    pub fn create_window(&mut self, screen: u32) -> WindowId {
        let mut window = Window::new(&self.config, self.lockdown);
        let mut geometry = window.geometry().clone();
        geometry.screen = screen;
        window.set_geometry(geometry);
        self.register_window(window)
    }

    fn register_window(&mut self, window: Window) -> WindowId {
        let id = window.id();
        log::debug!("Registered {} ({})", id, window.role());
        self.windows.insert(0, window);
        self.events.push(AppEvent::WindowCreated(id));
        if self.active_window.is_none() {
            self.active_window = Some(id);
            self.events.push(AppEvent::ActiveWindowChanged(Some(id)));
        }
        self.collect_events();
        id
    }

    /// Windows, most recently active first.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|w| w.id() == id)
    }

    /// Direct access to a window. Call [`pump`](Self::pump) afterwards so
    /// its events reach the app.
    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    pub fn active_window_id(&self) -> Option<WindowId> {
        self.active_window
    }

    pub fn active_window(&self) -> Option<&Window> {
        self.active_window.and_then(|id| self.window(id))
    }

    /// Focus `id`: it moves to the front and its active tab checks the disk.
    pub fn set_active_window(&mut self, id: WindowId) -> Result<()> {
        let index = self
            .windows
            .iter()
            .position(|w| w.id() == id)
            .with_context(|| format!("{} does not exist", id))?;
        let window = self.windows.remove(index);
        self.windows.insert(0, window);

        if self.active_window != Some(id) {
            self.active_window = Some(id);
            self.events.push(AppEvent::ActiveWindowChanged(Some(id)));
        }
        self.windows[0].focus_active_tab(self.io.as_ref());
        self.collect_events();
        Ok(())
    }

    /// Close window `id` with all its tabs. Closing the last window saves
    /// the print defaults and asks the loop to quit.
    pub fn close_window(&mut self, id: WindowId) -> Result<()> {
        let index = self
            .windows
            .iter()
            .position(|w| w.id() == id)
            .with_context(|| format!("{} does not exist", id))?;
        if !self.windows[index].can_close() {
            bail!(
                "{} cannot close in state {:?}",
                id,
                self.windows[index].state()
            );
        }

        self.windows[index].close_all_tabs(self.io.as_mut())?;
        self.collect_events();
        self.windows.remove(index);
        self.events.push(AppEvent::WindowClosed(id));
        log::debug!("Closed {}", id);

        if self.active_window == Some(id) {
            self.active_window = self.windows.first().map(Window::id);
            self.events.push(AppEvent::ActiveWindowChanged(self.active_window));
        }
        if self.windows.is_empty() {
            if let Err(err) = self.print_defaults.save() {
                log::warn!("Failed to save print defaults: {:#}", err);
            }
            self.events.push(AppEvent::Quit);
        }
        Ok(())
    }

    /// Move `tab` out of its window into a new one.
    pub fn move_tab_to_new_window(&mut self, tab: TabId) -> Result<WindowId> {
        let window = self
            .windows
            .iter_mut()
            .find(|w| w.contains_tab(tab))
            .with_context(|| format!("{} is not open", tab))?;
        let new_window = window.move_tab_to_new_window(tab)?;
        Ok(self.register_window(new_window))
    }

    /// Whether most of window `id` is visible in `viewport`.
    pub fn is_in_viewport(&self, id: WindowId, viewport: &Viewport) -> bool {
        self.window(id)
            .is_some_and(|w| w.geometry().is_in_viewport(viewport))
    }

    /// A window to reuse for documents shown in `viewport`: the active
    /// window if it is there, else any window there, else a new one.
    pub fn get_window_in_viewport(&mut self, viewport: &Viewport) -> WindowId {
        if let Some(id) = self.active_window {
            if self.is_in_viewport(id, viewport) {
                return id;
            }
        }
        let found = self
            .windows
            .iter()
            .find(|w| w.geometry().is_in_viewport(viewport))
            .map(Window::id);
        match found {
            Some(id) => id,
            None => self.create_window(viewport.screen),
        }
    }

    pub fn documents(&self) -> Vec<&Document> {
        self.windows.iter().flat_map(Window::documents).collect()
    }

    pub fn unsaved_documents(&self) -> Vec<&Document> {
        self.windows.iter().flat_map(Window::unsaved_documents).collect()
    }

    /// Whether any window is loading a document.
    pub fn is_loading(&self) -> bool {
        self.windows
            .iter()
            .any(|w| w.state().contains(WindowState::LOADING))
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.windows.iter().find_map(|w| w.tab(id))
    }

    // ========================================================================
    // Lockdown
    // ========================================================================

    pub fn lockdown(&self) -> Lockdown {
        self.lockdown
    }

    /// Replace the lockdown mask; every window re-derives its actions.
    pub fn set_lockdown(&mut self, lockdown: Lockdown) {
        if self.lockdown == lockdown {
            return;
        }
        log::info!("Lockdown changed to {:?}", lockdown);
        self.lockdown = lockdown;
        for window in &mut self.windows {
            window.set_lockdown(lockdown);
        }
        self.events.push(AppEvent::LockdownChanged(lockdown));
        self.collect_events();
    }

    pub fn set_lockdown_bit(&mut self, bit: Lockdown, value: bool) {
        let mut lockdown = self.lockdown;
        lockdown.set(bit, value);
        self.set_lockdown(lockdown);
    }

    // ========================================================================
    // Print defaults
    // ========================================================================

    /// Copy of the default page setup.
    pub fn default_page_setup(&mut self) -> PageSetup {
        self.print_defaults.page_setup()
    }

    pub fn set_default_page_setup(&mut self, setup: PageSetup) {
        self.print_defaults.set_page_setup(setup);
    }

    /// Copy of the default print settings.
    pub fn default_print_settings(&mut self) -> PrintSettings {
        self.print_defaults.print_settings()
    }

    pub fn set_default_print_settings(&mut self, settings: PrintSettings) {
        self.print_defaults.set_print_settings(settings);
    }

    // ========================================================================
    // Tab operations
    // ========================================================================

    /// Open `uri` in window `id`, or activate the tab already showing it there.
    pub fn open_location(
        &mut self,
        id: WindowId,
        uri: &str,
        encoding: Option<Encoding>,
        line: usize,
        create_if_missing: bool,
    ) -> Result<TabId> {
        let location =
            Location::parse(uri).with_context(|| format!("Invalid location '{}'", uri))?;
        let io = self.io.as_mut();
        let window = self
            .windows
            .iter_mut()
            .find(|w| w.id() == id)
            .with_context(|| format!("{} does not exist", id))?;

        let tab = match window.tab_by_location(&location).map(Tab::id) {
            Some(existing) => {
                window.set_active_tab(existing)?;
                existing
            }
            None => window.open_tab(io, location, encoding, line, create_if_missing, true),
        };
        self.collect_events();
        Ok(tab)
    }

    /// Open the files named on the command line in window `id`.
    ///
    /// Refused as a whole under the command-line lockdown. Arguments that
    /// are not valid locations are logged and skipped.
    pub fn open_command_line(&mut self, id: WindowId, args: &[String]) -> Result<Vec<TabId>> {
        self.check_lockdown(Lockdown::COMMAND_LINE, "Opening files from the command line")?;
        let mut tabs = Vec::new();
        for arg in args {
            match self.open_location(id, arg, None, 0, true) {
                Ok(tab) => tabs.push(tab),
                Err(err) => log::warn!("Skipping '{}': {:#}", arg, err),
            }
        }
        Ok(tabs)
    }

    /// Run `f` on tab `id` with the I/O backend, then collect its events.
    pub fn with_tab<R>(
        &mut self,
        id: TabId,
        f: impl FnOnce(&mut Tab, &mut dyn DocumentIo) -> R,
    ) -> Option<R> {
        let io = self.io.as_mut();
        let window = self.windows.iter_mut().find(|w| w.contains_tab(id))?;
        let result = window.update_tab(id, |tab| f(tab, io));
        self.collect_events();
        result
    }

    pub fn save_tab(&mut self, id: TabId) -> Result<()> {
        self.check_lockdown(Lockdown::SAVE_TO_DISK, "Saving")?;
        self.with_tab(id, |tab, io| tab.save(io))
            .with_context(|| format!("{} is not open", id))?
    }

    pub fn save_tab_as(
        &mut self,
        id: TabId,
        uri: &str,
        encoding: Encoding,
        newline: NewlineType,
    ) -> Result<()> {
        self.check_lockdown(Lockdown::SAVE_TO_DISK, "Saving")?;
        let location =
            Location::parse(uri).with_context(|| format!("Invalid location '{}'", uri))?;
        self.with_tab(id, |tab, io| tab.save_as(io, location, encoding, newline))
            .with_context(|| format!("{} is not open", id))?
    }

    pub fn print_tab(
        &mut self,
        id: TabId,
        job: Box<dyn PrintJob>,
        action: PrintAction,
    ) -> Result<()> {
        self.check_lockdown(Lockdown::PRINTING, "Printing")?;
        let defaults = &mut self.print_defaults;
        let window = self
            .windows
            .iter_mut()
            .find(|w| w.contains_tab(id))
            .with_context(|| format!("{} is not open", id))?;
        let result = window
            .update_tab(id, |tab| tab.print(job, action, defaults))
            .with_context(|| format!("{} is not open", id))?;
        self.collect_events();
        result
    }

    pub fn respond(&mut self, id: TabId, response: NoticeResponse) -> Result<()> {
        self.with_tab(id, |tab, io| tab.respond(io, response))
            .with_context(|| format!("{} is not open", id))?
    }

    pub fn close_tab(&mut self, id: TabId) -> Result<()> {
        let io = self.io.as_mut();
        let window = self
            .windows
            .iter_mut()
            .find(|w| w.contains_tab(id))
            .with_context(|| format!("{} is not open", id))?;
        let result = window.close_tab(io, id);
        self.collect_events();
        result
    }

    fn check_lockdown(&self, bit: Lockdown, what: &str) -> Result<()> {
        if self.lockdown.contains(bit) {
            log::warn!("{} is disabled by lockdown", what);
            bail!("{} is disabled by lockdown", what);
        }
        Ok(())
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// One turn of the cooperative loop.
    pub fn pump(&mut self, now: Instant) {
        for message in self.io.poll_messages() {
            self.dispatch(message, now);
        }
        for window in &mut self.windows {
            window.poll_timers(self.io.as_mut(), now);
        }
        for window in &mut self.windows {
            window.close_requested_tabs(self.io.as_mut());
        }
        self.collect_events();
    }

    fn dispatch(&mut self, message: IoMessage, now: Instant) {
        let tab = message.tab();
        let Some(index) = self.windows.iter().position(|w| w.contains_tab(tab)) else {
            log::debug!("Dropping I/O message for closed {}", tab);
            return;
        };

        let open_elsewhere = matches!(message, IoMessage::Loaded { .. })
            && self.windows[index]
                .tab(tab)
                .and_then(Tab::location)
                .is_some_and(|location| {
                    self.windows
                        .iter()
                        .enumerate()
                        .any(|(i, w)| i != index && w.tab_by_location(location).is_some())
                });

        if let Err(err) = self.windows[index].dispatch_io_with(message, now, open_elsewhere) {
            log::error!("{:#}", err);
        }
    }

    /// Earliest auto-save timer across all windows.
    pub fn next_timer_due(&self) -> Option<Instant> {
        self.windows.iter().filter_map(Window::next_timer_due).min()
    }

    /// Drain app events, oldest first.
    pub fn take_events(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain the forwarded window events, oldest first.
    pub fn take_window_events(&mut self) -> Vec<(WindowId, WindowEvent)> {
        std::mem::take(&mut self.window_events)
    }

    /// Pull window events, acting on the ones the app owns.
    fn collect_events(&mut self) {
        for window in &mut self.windows {
            let window_id = window.id();
            for event in window.take_events() {
                if let WindowEvent::Tab(tab_id, tab_event) = &event {
                    match tab_event {
                        TabEvent::RecentAdded(location) => {
                            self.events.push(AppEvent::RecentAdded(location.clone()));
                        }
                        TabEvent::RecentRemoved(location) => {
                            self.events.push(AppEvent::RecentRemoved(location.clone()));
                        }
                        TabEvent::PrintSettingsUsed => {
                            if let Some(tab) = window.tab(*tab_id) {
                                if let Some(setup) = tab.page_setup() {
                                    self.print_defaults.set_page_setup(setup.clone());
                                }
                                if let Some(settings) = tab.print_settings() {
                                    self.print_defaults.set_print_settings(settings.clone());
                                }
                            }
                        }
                        _ => {}
                    }
                }
                self.window_events.push((window_id, event));
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        INSTANCE_ALIVE.with(|alive| alive.set(false));
    }
}
