//! Events emitted by tabs, windows and the app.
//!
//! Each emitter keeps a FIFO outbox that its owner drains after every
//! operation, so delivery order always matches emission order:
//!
//! ```text
//! Tab ──TabEvent──► Window ──WindowEvent──► App ──AppEvent──► presentation
//! ```

use crate::{Location, Lockdown, TabId, TabState, WindowId, WindowState};

/// Emitted by a tab.
#[derive(Debug, Clone, PartialEq)]
pub enum TabEvent {
    /// `state` changed to the carried value.
    StateChanged(TabState),
    /// Title or tooltip changed.
    NameChanged,
    /// The current notice was replaced or cleared.
    NoticeChanged,
    /// A location was successfully read or written.
    RecentAdded(Location),
    /// A location failed and should leave the recent files list.
    RecentRemoved(Location),
    /// The tab asks its owner to remove it after the current callback.
    CloseRequested,
    /// A print job finished and its setup should become the app default.
    PrintSettingsUsed,
}

/// Emitted by a window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    TabAdded(TabId),
    TabRemoved(TabId),
    TabsReordered,
    ActiveTabChanged(Option<TabId>),
    ActiveTabStateChanged(TabState),
    StateChanged(WindowState),
    /// The documents list was rebuilt.
    DocumentsListRefreshed,
    /// Action sensitivity was recomputed and differs from before.
    SensitivityChanged,
    /// Forwarded event of a contained tab.
    Tab(TabId, TabEvent),
}

/// Emitted by the app.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    WindowCreated(WindowId),
    WindowClosed(WindowId),
    ActiveWindowChanged(Option<WindowId>),
    LockdownChanged(Lockdown),
    RecentAdded(Location),
    RecentRemoved(Location),
    /// The last window closed; the event loop should stop.
    Quit,
}
