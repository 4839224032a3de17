//! Which window actions are currently available.

use quire_core::{Lockdown, TabState, WindowState};
use quire_tab::Tab;

/// Enabled state of the window actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSensitivity {
    pub new: bool,
    pub open: bool,
    pub save: bool,
    pub save_as: bool,
    pub save_all: bool,
    pub revert: bool,
    pub print: bool,
    pub print_preview: bool,
    pub page_setup: bool,
    pub close: bool,
    pub close_all: bool,
    pub quit: bool,
}

impl ActionSensitivity {
    pub fn compute(
        state: WindowState,
        lockdown: Lockdown,
        active: Option<&Tab>,
        num_tabs: usize,
    ) -> Self {
        let busy = state.intersects(WindowState::SAVING | WindowState::PRINTING);
        let session = state.contains(WindowState::SAVING_SESSION);
        let save_locked = lockdown.contains(Lockdown::SAVE_TO_DISK);
        let print_locked = lockdown.contains(Lockdown::PRINTING);
        let active_state = active.map(Tab::state);

        let can_save = active_state.is_some_and(TabState::permits_save) && !save_locked;
        let can_print = matches!(
            active_state,
            Some(TabState::Normal | TabState::ShowingPrintPreview)
        ) && !print_locked;

        Self {
            new: !session,
            open: !session,
            save: can_save,
            save_as: can_save,
            save_all: num_tabs > 0
                && !state.contains(WindowState::PRINTING)
                && !save_locked,
            revert: active.is_some_and(|tab| {
                matches!(
                    tab.state(),
                    TabState::Normal | TabState::ExternallyModifiedNotification
                ) && !tab.document().is_untitled()
            }),
            print: can_print,
            print_preview: can_print,
            page_setup: !lockdown.contains(Lockdown::PRINT_SETUP),
            close: matches!(
                active_state,
                Some(s) if !matches!(s, TabState::Saving | TabState::ShowingPrintPreview)
            ),
            close_all: num_tabs > 0 && !busy,
            quit: !busy,
        }
    }
}
