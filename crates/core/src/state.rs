//! Tab states, aggregated window state and policy bitmasks.

use std::fmt;

use bitflags::bitflags;

/// Lifecycle state of a single tab.
///
/// Exactly one state is active at a time. A tab created to load a file
/// starts in `Loading`, an empty tab starts in `Normal`, and `Closing` is
/// entered right before the tab is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TabState {
    #[default]
    Normal,
    Loading,
    Reverting,
    Saving,
    Printing,
    PrintPreviewing,
    ShowingPrintPreview,
    LoadingError,
    RevertingError,
    SavingError,
    GenericError,
    ExternallyModifiedNotification,
    Closing,
}

impl TabState {
    /// States reached through a failed I/O operation.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            TabState::LoadingError
                | TabState::RevertingError
                | TabState::SavingError
                | TabState::GenericError
        )
    }

    /// A load or revert is in flight.
    pub fn is_loading(self) -> bool {
        matches!(self, TabState::Loading | TabState::Reverting)
    }

    /// A print job exists for the tab.
    pub fn is_printing(self) -> bool {
        matches!(
            self,
            TabState::Printing | TabState::PrintPreviewing | TabState::ShowingPrintPreview
        )
    }

    /// States in which the auto-save timer may be armed.
    pub fn permits_auto_save(self) -> bool {
        matches!(self, TabState::Normal | TabState::ShowingPrintPreview)
    }

    /// States from which a save may start.
    pub fn permits_save(self) -> bool {
        matches!(
            self,
            TabState::Normal
                | TabState::ExternallyModifiedNotification
                | TabState::ShowingPrintPreview
        )
    }

    /// Window bit set by a tab in this state (empty if none).
    pub fn window_state_bit(self) -> WindowState {
        match self {
            TabState::Loading | TabState::Reverting => WindowState::LOADING,
            TabState::Saving => WindowState::SAVING,
            TabState::Printing | TabState::PrintPreviewing => WindowState::PRINTING,
            s if s.is_error() => WindowState::ERROR,
            _ => WindowState::empty(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TabState::Normal => "normal",
            TabState::Loading => "loading",
            TabState::Reverting => "reverting",
            TabState::Saving => "saving",
            TabState::Printing => "printing",
            TabState::PrintPreviewing => "print-previewing",
            TabState::ShowingPrintPreview => "showing-print-preview",
            TabState::LoadingError => "loading-error",
            TabState::RevertingError => "reverting-error",
            TabState::SavingError => "saving-error",
            TabState::GenericError => "generic-error",
            TabState::ExternallyModifiedNotification => "externally-modified-notification",
            TabState::Closing => "closing",
        }
    }
}

impl fmt::Display for TabState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Coarse state of a window, derived from its tabs.
    ///
    /// `SAVING_SESSION` is owned by the session collaborator and survives
    /// recomputation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowState: u32 {
        const LOADING = 1 << 0;
        const SAVING = 1 << 1;
        const PRINTING = 1 << 2;
        const ERROR = 1 << 3;
        const SAVING_SESSION = 1 << 4;
    }
}

bitflags! {
    /// Administrative restrictions on user-facing operations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Lockdown: u32 {
        const COMMAND_LINE = 1 << 0;
        const PRINTING = 1 << 1;
        const PRINT_SETUP = 1 << 2;
        const SAVE_TO_DISK = 1 << 3;
        const ALL = Self::COMMAND_LINE.bits()
            | Self::PRINTING.bits()
            | Self::PRINT_SETUP.bits()
            | Self::SAVE_TO_DISK.bits();
    }
}

bitflags! {
    /// Flags passed to the document saver.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SaveFlags: u32 {
        /// Overwrite even if the file changed on disk since it was read.
        const IGNORE_MTIME = 1 << 0;
        /// Save even if the backup copy cannot be created.
        const IGNORE_BACKUP = 1 << 1;
        /// Keep an existing backup file untouched.
        const PRESERVE_BACKUP = 1 << 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bit_mapping() {
        assert_eq!(TabState::Loading.window_state_bit(), WindowState::LOADING);
        assert_eq!(TabState::Reverting.window_state_bit(), WindowState::LOADING);
        assert_eq!(TabState::Saving.window_state_bit(), WindowState::SAVING);
        assert_eq!(TabState::Printing.window_state_bit(), WindowState::PRINTING);
        assert_eq!(
            TabState::PrintPreviewing.window_state_bit(),
            WindowState::PRINTING
        );
        assert_eq!(
            TabState::SavingError.window_state_bit(),
            WindowState::ERROR
        );
        assert_eq!(
            TabState::GenericError.window_state_bit(),
            WindowState::ERROR
        );
    }

    #[test]
    fn test_states_without_window_bit() {
        for state in [
            TabState::Normal,
            TabState::ShowingPrintPreview,
            TabState::ExternallyModifiedNotification,
            TabState::Closing,
        ] {
            assert!(state.window_state_bit().is_empty(), "{state}");
        }
    }

    #[test]
    fn test_auto_save_states() {
        assert!(TabState::Normal.permits_auto_save());
        assert!(TabState::ShowingPrintPreview.permits_auto_save());
        assert!(!TabState::Saving.permits_auto_save());
        assert!(!TabState::ExternallyModifiedNotification.permits_auto_save());
    }

    #[test]
    fn test_lockdown_all() {
        assert!(Lockdown::ALL.contains(Lockdown::SAVE_TO_DISK));
        assert_eq!(Lockdown::ALL.bits(), 0xF);
    }
}
