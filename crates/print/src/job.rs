//! Interface of the external print backend.

use anyhow::Result;

use crate::{PageSetup, PrintSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintAction {
    Print,
    Preview,
}

/// Terminal result reported by a print job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintJobResult {
    /// The job completed; its settings may be remembered.
    Applied,
    Cancelled,
    Failed(String),
}

/// Opaque handle of a rendered preview, shown in place of the text view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewHandle(pub u64);

/// A single print or preview operation for one document.
///
/// `print` only starts the job. Progress, preview readiness and the
/// single terminal result come back later through the owning tab.
pub trait PrintJob {
    /// Start the job. An `Err` means it never started.
    fn print(
        &mut self,
        action: PrintAction,
        page_setup: &PageSetup,
        settings: &PrintSettings,
    ) -> Result<()>;

    /// Ask the job to stop; it still reports a terminal result.
    fn cancel(&mut self);

    /// Page setup in effect, possibly edited by the user.
    fn page_setup(&self) -> PageSetup;

    /// Print settings in effect, possibly edited by the user.
    fn print_settings(&self) -> PrintSettings;
}
