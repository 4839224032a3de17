//! Printing support for quire.
//!
//! This crate provides:
//! - `PageSetup` and `PrintSettings` value types
//! - `PrintDefaults`, the process-wide last-used setup persisted under the
//!   user config directory
//! - `PrintJob`, the interface of the external print backend

mod defaults;
mod job;
mod settings;

pub use defaults::{PrintDefaults, PAGE_SETUP_FILE, PRINT_SETTINGS_FILE};
pub use job::{PreviewHandle, PrintAction, PrintJob, PrintJobResult};
pub use settings::{Orientation, PageSetup, PaperSize, PrintSettings};
