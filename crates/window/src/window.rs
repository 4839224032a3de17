//! The `Window` type.

use std::time::Instant;

use anyhow::{bail, Context, Result};

use quire_config::{Config, EditorSettings};
use quire_core::{
    Encoding, Location, Lockdown, TabEvent, TabId, TabState, WindowEvent, WindowId, WindowState,
};
use quire_document::{Document, DocumentIo, IoMessage};
use quire_tab::{Tab, TabSettings};

use crate::{ActionSensitivity, PanelLayout, WindowGeometry};

/// A top-level container of tabs.
pub struct Window {
    id: WindowId,
    role: String,
    tabs: Vec<Tab>,
    /// Looked up on use; cleared when the tab leaves.
    active: Option<TabId>,
    state: WindowState,
    num_tabs_with_error: usize,
    /// Set during bulk removal to batch documents list refreshes.
    removing_tabs: bool,
    /// Tabs that asked to be closed, removed after the current callback.
    pending_close: Vec<TabId>,
    geometry: WindowGeometry,
    layout: PanelLayout,
    editor: EditorSettings,
    lockdown: Lockdown,
    sensitivity: ActionSensitivity,
    events: Vec<WindowEvent>,
}

impl Window {
    pub fn new(config: &Config, lockdown: Lockdown) -> Self {
        Self::with_parts(
            WindowGeometry::from_settings(&config.window),
            PanelLayout::from_settings(&config.window),
            config.editor.clone(),
            lockdown,
        )
    }

    fn with_parts(
        geometry: WindowGeometry,
        layout: PanelLayout,
        editor: EditorSettings,
        lockdown: Lockdown,
    ) -> Self {
        let id = WindowId::next();
        log::debug!("Created {}", id);
        Self {
            id,
            role: format!("quire-window-{}", id.as_u64()),
            tabs: Vec::new(),
            active: None,
            state: WindowState::empty(),
            num_tabs_with_error: 0,
            removing_tabs: false,
            pending_close: Vec::new(),
            geometry,
            layout,
            editor,
            lockdown,
            sensitivity: ActionSensitivity::compute(WindowState::empty(), lockdown, None, 0),
            events: Vec::new(),
        }
    }

    /// Empty window with this window's size, panels and bars.
    fn clone_empty(&self) -> Self {
        Self::with_parts(
            self.geometry.for_clone(),
            self.layout.clone(),
            self.editor.clone(),
            self.lockdown,
        )
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Session role, unique per window.
    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn num_tabs(&self) -> usize {
        self.tabs.len()
    }

    pub fn num_tabs_with_error(&self) -> usize {
        self.num_tabs_with_error
    }

    pub fn is_removing_tabs(&self) -> bool {
        self.removing_tabs
    }

    pub fn geometry(&self) -> &WindowGeometry {
        &self.geometry
    }

    pub fn set_geometry(&mut self, geometry: WindowGeometry) {
        self.geometry = geometry;
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: PanelLayout) {
        self.layout = layout;
    }

    pub fn lockdown(&self) -> Lockdown {
        self.lockdown
    }

    pub fn sensitivity(&self) -> ActionSensitivity {
        self.sensitivity
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id() == id)
    }

    pub fn contains_tab(&self, id: TabId) -> bool {
        self.tab(id).is_some()
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.tab(id))
    }

    /// First tab showing `location`.
    pub fn tab_by_location(&self, location: &Location) -> Option<&Tab> {
        self.tabs
            .iter()
            .find(|t| t.state() != TabState::Closing && t.location() == Some(location))
    }

    pub fn documents(&self) -> Vec<&Document> {
        self.tabs.iter().map(Tab::document).collect()
    }

    pub fn unsaved_documents(&self) -> Vec<&Document> {
        self.tabs
            .iter()
            .map(Tab::document)
            .filter(|d| d.is_modified())
            .collect()
    }

    /// Whether the window may close now, with every one of its tabs.
    pub fn can_close(&self) -> bool {
        !self.state.intersects(
            WindowState::SAVING | WindowState::PRINTING | WindowState::SAVING_SESSION,
        ) && !self.tabs.iter().any(pins_window)
    }

    /// Drain events emitted since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<WindowEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Tab creation and removal
    // ========================================================================

    fn tab_settings(&self) -> TabSettings {
        TabSettings::from_config(&self.editor, self.lockdown)
    }

    /// Append an empty untitled tab.
    pub fn create_tab(&mut self, jump_to: bool) -> TabId {
        let tab = Tab::new(self.tab_settings());
        self.add_tab(tab, jump_to)
    }

    /// Append a tab loading `uri`. Fails only if `uri` is malformed.
    pub fn create_tab_from_location(
        &mut self,
        io: &mut dyn DocumentIo,
        uri: &str,
        encoding: Option<Encoding>,
        line: usize,
        create_if_missing: bool,
        jump_to: bool,
    ) -> Result<TabId> {
        let location =
            Location::parse(uri).with_context(|| format!("Invalid location '{}'", uri))?;
        Ok(self.open_tab(io, location, encoding, line, create_if_missing, jump_to))
    }

    /// Append a tab loading an already resolved location.
    pub fn open_tab(
        &mut self,
        io: &mut dyn DocumentIo,
        location: Location,
        encoding: Option<Encoding>,
        line: usize,
        create_if_missing: bool,
        jump_to: bool,
    ) -> TabId {
        let tab = Tab::new_from_location(
            self.tab_settings(),
            io,
            location,
            encoding,
            line,
            create_if_missing,
        );
        self.add_tab(tab, jump_to)
    }

    /// Take ownership of `tab` and append it.
    pub fn add_tab(&mut self, tab: Tab, jump_to: bool) -> TabId {
        let id = tab.id();
        log::debug!("{}: adding {}", self.id, id);
        self.tabs.push(tab);
        self.events.push(WindowEvent::TabAdded(id));
        self.sync_tab(id);
        if jump_to || self.active.is_none() {
            self.set_active(Some(id));
        }
        self.update_state();
        self.refresh_documents_list();
        id
    }

    /// Close `id`. Tabs that are saving or showing a print preview stay open.
    pub fn close_tab(&mut self, io: &mut dyn DocumentIo, id: TabId) -> Result<()> {
        let Some(tab) = self.tab(id) else {
            bail!("{} is not in {}", id, self.id);
        };
        if pins_window(tab) {
            log::error!("{}: cannot close {} in state {}", self.id, id, tab.state());
            bail!("{}: cannot close {} in state {}", self.id, id, tab.state());
        }
        self.remove_tab(io, id)
    }

    /// Close several tabs, refreshing the documents list once.
    ///
    /// Either every tab closes or none does.
    pub fn close_tabs(&mut self, io: &mut dyn DocumentIo, ids: &[TabId]) -> Result<()> {
        if self
            .state
            .intersects(WindowState::SAVING | WindowState::SAVING_SESSION)
        {
            bail!("{}: cannot close tabs while saving", self.id);
        }
        for &id in ids {
            match self.tab(id) {
                None => bail!("{} is not in {}", id, self.id),
                Some(tab) if pins_window(tab) => {
                    log::error!("{}: cannot close {} in state {}", self.id, id, tab.state());
                    bail!("{}: cannot close {} in state {}", self.id, id, tab.state());
                }
                Some(_) => {}
            }
        }

        self.removing_tabs = true;
        let mut result = Ok(());
        for &id in ids {
            if let Err(err) = self.remove_tab(io, id) {
                log::warn!("{}: {:#}", self.id, err);
                result = Err(err);
            }
        }
        self.removing_tabs = false;
        self.events.push(WindowEvent::DocumentsListRefreshed);
        result
    }

    pub fn close_all_tabs(&mut self, io: &mut dyn DocumentIo) -> Result<()> {
        let ids: Vec<TabId> = self.tabs.iter().map(Tab::id).collect();
        self.close_tabs(io, &ids)
    }

    /// Remove the tabs that asked to be closed during earlier callbacks.
    pub fn close_requested_tabs(&mut self, io: &mut dyn DocumentIo) {
        for id in std::mem::take(&mut self.pending_close) {
            if !self.contains_tab(id) {
                continue;
            }
            if let Err(err) = self.remove_tab(io, id) {
                log::warn!("{}: {:#}", self.id, err);
            }
        }
    }

    pub fn has_close_requests(&self) -> bool {
        !self.pending_close.is_empty()
    }

    /// Move `id` into a new window cloned from this one.
    pub fn move_tab_to_new_window(&mut self, id: TabId) -> Result<Window> {
        if self.tabs.len() <= 1 {
            bail!("{}: cannot move the only tab to a new window", self.id);
        }
        let tab = self.detach_tab(id)?;
        let mut window = self.clone_empty();
        window.add_tab(tab, true);
        log::info!("{}: moved {} to {}", self.id, id, window.id);
        Ok(window)
    }

    fn remove_tab(&mut self, io: &mut dyn DocumentIo, id: TabId) -> Result<()> {
        let index = self.index_of(id).with_context(|| format!("{} is not in {}", id, self.id))?;
        self.tabs[index].begin_close(io)?;
        self.sync_tab(id);
        self.tabs.remove(index);
        self.after_removal(id, index);
        Ok(())
    }

    fn detach_tab(&mut self, id: TabId) -> Result<Tab> {
        let index = self.index_of(id).with_context(|| format!("{} is not in {}", id, self.id))?;
        let tab = self.tabs.remove(index);
        self.after_removal(id, index);
        Ok(tab)
    }

    fn after_removal(&mut self, id: TabId, index: usize) {
        log::debug!("{}: removed {}", self.id, id);
        self.pending_close.retain(|t| *t != id);
        self.events.push(WindowEvent::TabRemoved(id));
        if self.active == Some(id) {
            let next = if self.tabs.is_empty() {
                None
            } else {
                Some(self.tabs[index.min(self.tabs.len() - 1)].id())
            };
            self.set_active(next);
        }
        self.update_state();
        self.refresh_documents_list();
    }

    // ========================================================================
    // Active tab and ordering
    // ========================================================================

    pub fn set_active_tab(&mut self, id: TabId) -> Result<()> {
        if !self.contains_tab(id) {
            bail!("{} is not in {}", id, self.id);
        }
        self.set_active(Some(id));
        Ok(())
    }

    /// Activate the next tab, wrapping around.
    pub fn next_tab(&mut self) {
        if let Some(index) = self.active.and_then(|id| self.index_of(id)) {
            let next = (index + 1) % self.tabs.len();
            self.set_active(Some(self.tabs[next].id()));
        }
    }

    /// Activate the previous tab, wrapping around.
    pub fn prev_tab(&mut self) {
        if let Some(index) = self.active.and_then(|id| self.index_of(id)) {
            let prev = if index == 0 {
                self.tabs.len() - 1
            } else {
                index - 1
            };
            self.set_active(Some(self.tabs[prev].id()));
        }
    }

    /// Move `id` to position `index` (clamped to the end).
    pub fn move_tab(&mut self, id: TabId, index: usize) -> Result<()> {
        let from = self.index_of(id).with_context(|| format!("{} is not in {}", id, self.id))?;
        let tab = self.tabs.remove(from);
        let to = index.min(self.tabs.len());
        self.tabs.insert(to, tab);
        if from != to {
            self.events.push(WindowEvent::TabsReordered);
        }
        Ok(())
    }

    fn set_active(&mut self, id: Option<TabId>) {
        if self.active == id {
            return;
        }
        self.active = id;
        self.events.push(WindowEvent::ActiveTabChanged(id));
        self.update_sensitivity();
    }

    fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id() == id)
    }

    // ========================================================================
    // Driving tabs
    // ========================================================================

    /// Run `f` on tab `id`, then forward its events and recompute the
    /// window state.
    pub fn update_tab<R>(&mut self, id: TabId, f: impl FnOnce(&mut Tab) -> R) -> Option<R> {
        let tab = self.tabs.iter_mut().find(|t| t.id() == id)?;
        let result = f(tab);
        self.sync_tab(id);
        Some(result)
    }

    /// Deliver a backend message to the tab it belongs to.
    pub fn dispatch_io(&mut self, message: IoMessage, now: Instant) -> Result<()> {
        self.dispatch_io_with(message, now, false)
    }

    /// Like [`dispatch_io`](Self::dispatch_io), with `open_elsewhere` telling
    /// whether a tab of another window already shows the loaded location.
    pub fn dispatch_io_with(
        &mut self,
        message: IoMessage,
        now: Instant,
        open_elsewhere: bool,
    ) -> Result<()> {
        let id = message.tab();
        let already_open = matches!(message, IoMessage::Loaded { .. })
            && (open_elsewhere || self.is_open_elsewhere(id));

        let result = self.update_tab(id, move |tab| match message {
            IoMessage::LoadProgress { done, total, .. } => {
                tab.on_load_progress(done, total, now);
                Ok(())
            }
            IoMessage::Loaded { outcome, .. } => tab.on_loaded(outcome, already_open),
            IoMessage::SaveProgress { done, total, .. } => {
                tab.on_save_progress(done, total, now);
                Ok(())
            }
            IoMessage::Saved { result, .. } => tab.on_saved(result),
        });
        match result {
            Some(result) => result,
            None => bail!("{} is not in {}", id, self.id),
        }
    }

    /// Whether another live tab shows the location `id` is loading.
    fn is_open_elsewhere(&self, id: TabId) -> bool {
        let Some(location) = self.tab(id).and_then(Tab::location) else {
            return false;
        };
        self.tabs.iter().any(|t| {
            t.id() != id && t.state() != TabState::Closing && t.location() == Some(location)
        })
    }

    /// Fire due auto-save timers.
    pub fn poll_timers(&mut self, io: &mut dyn DocumentIo, now: Instant) {
        let ids: Vec<TabId> = self.tabs.iter().map(Tab::id).collect();
        for id in ids {
            self.update_tab(id, |tab| tab.poll_timers(&mut *io, now));
        }
    }

    /// Earliest pending timer of any tab.
    pub fn next_timer_due(&self) -> Option<Instant> {
        self.tabs
            .iter()
            .filter_map(|t| t.auto_save_timer().map(|timer| timer.due))
            .min()
    }

    /// The window regained focus: let the active tab compare with disk.
    pub fn focus_active_tab(&mut self, io: &dyn DocumentIo) -> bool {
        match self.active {
            Some(id) => self
                .update_tab(id, |tab| tab.check_externally_modified(io))
                .unwrap_or(false),
            None => false,
        }
    }

    // ========================================================================
    // State aggregation
    // ========================================================================

    /// Raised by the session collaborator while it writes the session.
    pub fn set_saving_session(&mut self, saving: bool) {
        let mut state = self.state;
        state.set(WindowState::SAVING_SESSION, saving);
        if state != self.state {
            self.state = state;
            self.events.push(WindowEvent::StateChanged(state));
        }
        self.update_sensitivity();
    }

    /// Apply a new lockdown mask to the actions and to every tab.
    pub fn set_lockdown(&mut self, lockdown: Lockdown) {
        self.lockdown = lockdown;
        let auto_save = self.editor.auto_save;
        let ids: Vec<TabId> = self.tabs.iter().map(Tab::id).collect();
        for id in ids {
            self.update_tab(id, |tab| tab.set_auto_save_enabled(auto_save, lockdown));
        }
        self.update_sensitivity();
    }

    /// Forward the pending events of tab `id`.
    fn sync_tab(&mut self, id: TabId) {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id() == id) else {
            return;
        };
        let events = tab.take_events();
        if events.is_empty() {
            return;
        }

        for event in events {
            let state = match &event {
                TabEvent::StateChanged(state) => Some(*state),
                TabEvent::CloseRequested => {
                    if !self.pending_close.contains(&id) {
                        self.pending_close.push(id);
                    }
                    None
                }
                _ => None,
            };
            self.events.push(WindowEvent::Tab(id, event));
            if let Some(state) = state {
                if self.active == Some(id) {
                    self.events.push(WindowEvent::ActiveTabStateChanged(state));
                }
                self.update_state();
            }
        }
        self.update_sensitivity();
    }

    fn update_state(&mut self) {
        let mut state = self.state & WindowState::SAVING_SESSION;
        let mut errors = 0;
        for tab in &self.tabs {
            if tab.state().is_error() {
                errors += 1;
            }
            state |= tab.state().window_state_bit();
        }
        self.num_tabs_with_error = errors;

        if state != self.state {
            log::debug!("{}: state {:?} -> {:?}", self.id, self.state, state);
            self.state = state;
            self.events.push(WindowEvent::StateChanged(state));
        }
        self.update_sensitivity();
    }

    fn update_sensitivity(&mut self) {
        let sensitivity = ActionSensitivity::compute(
            self.state,
            self.lockdown,
            self.active_tab(),
            self.tabs.len(),
        );
        if sensitivity != self.sensitivity {
            self.sensitivity = sensitivity;
            self.events.push(WindowEvent::SensitivityChanged);
        }
    }

    fn refresh_documents_list(&mut self) {
        if !self.removing_tabs {
            self.events.push(WindowEvent::DocumentsListRefreshed);
        }
    }
}

/// Tabs that must not be closed in their current state.
fn pins_window(tab: &Tab) -> bool {
    matches!(
        tab.state(),
        TabState::Saving | TabState::ShowingPrintPreview
    )
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("tabs", &self.tabs)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
