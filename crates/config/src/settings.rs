//! Configuration structures for quire settings.

use serde::{Deserialize, Serialize};

use quire_core::Lockdown;

use crate::defaults;

/// Application configuration with nested sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Editor settings
    #[serde(default)]
    pub editor: EditorSettings,

    /// Administrative restrictions
    #[serde(default)]
    pub lockdown: LockdownSettings,

    /// Geometry and chrome of new windows
    #[serde(default)]
    pub window: WindowSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Save modified documents periodically
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,

    /// Auto-save period in minutes
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: i32,

    /// Keep a `name~` copy of the previous file content on save
    #[serde(default = "default_create_backup_copy")]
    pub create_backup_copy: bool,
}

impl EditorSettings {
    /// Auto-save period, with non-positive values replaced by the default.
    pub fn auto_save_interval_minutes(&self) -> u32 {
        if self.auto_save_interval > 0 {
            self.auto_save_interval as u32
        } else {
            defaults::AUTO_SAVE_INTERVAL as u32
        }
    }
}

/// Lockdown settings.
///
/// Deployments set these to forbid operations for every user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockdownSettings {
    #[serde(default)]
    pub disable_command_line: bool,

    #[serde(default)]
    pub disable_printing: bool,

    #[serde(default)]
    pub disable_print_setup: bool,

    #[serde(default)]
    pub disable_save_to_disk: bool,
}

impl LockdownSettings {
    /// Convert to the runtime bitmask.
    pub fn to_mask(&self) -> Lockdown {
        let mut mask = Lockdown::empty();
        mask.set(Lockdown::COMMAND_LINE, self.disable_command_line);
        mask.set(Lockdown::PRINTING, self.disable_printing);
        mask.set(Lockdown::PRINT_SETUP, self.disable_print_setup);
        mask.set(Lockdown::SAVE_TO_DISK, self.disable_save_to_disk);
        mask
    }
}

/// Window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,

    #[serde(default)]
    pub maximized: bool,

    #[serde(default = "default_true")]
    pub side_panel_visible: bool,

    #[serde(default)]
    pub bottom_panel_visible: bool,

    #[serde(default = "default_side_panel_size")]
    pub side_panel_size: u32,

    #[serde(default = "default_bottom_panel_size")]
    pub bottom_panel_size: u32,

    #[serde(default = "default_true")]
    pub toolbar_visible: bool,

    #[serde(default = "default_true")]
    pub statusbar_visible: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log file path (optional)
    #[serde(default)]
    pub file_path: Option<String>,

    /// Minimum log level (debug, info, warn, error)
    #[serde(default = "default_min_level")]
    pub min_level: String,

    /// Number of entries kept in memory
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

// Default value functions for serde
fn default_auto_save() -> bool {
    defaults::AUTO_SAVE
}

fn default_auto_save_interval() -> i32 {
    defaults::AUTO_SAVE_INTERVAL
}

fn default_create_backup_copy() -> bool {
    defaults::CREATE_BACKUP_COPY
}

fn default_window_width() -> u32 {
    defaults::WINDOW_WIDTH
}

fn default_window_height() -> u32 {
    defaults::WINDOW_HEIGHT
}

fn default_side_panel_size() -> u32 {
    defaults::SIDE_PANEL_SIZE
}

fn default_bottom_panel_size() -> u32 {
    defaults::BOTTOM_PANEL_SIZE
}

fn default_true() -> bool {
    true
}

fn default_min_level() -> String {
    defaults::MIN_LOG_LEVEL.to_string()
}

fn default_max_entries() -> usize {
    defaults::MAX_LOG_ENTRIES
}

// Default implementations
impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            auto_save: default_auto_save(),
            auto_save_interval: default_auto_save_interval(),
            create_backup_copy: default_create_backup_copy(),
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            maximized: false,
            side_panel_visible: true,
            bottom_panel_visible: false,
            side_panel_size: default_side_panel_size(),
            bottom_panel_size: default_bottom_panel_size(),
            toolbar_visible: true,
            statusbar_visible: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file_path: None,
            min_level: default_min_level(),
            max_entries: default_max_entries(),
        }
    }
}
