//! Document lifecycle state machine of a single tab.
//!
//! A `Tab` owns one `Document` and drives its loads, saves, reverts and
//! print jobs. Operations start asynchronous work through `DocumentIo` or
//! `PrintJob` and return immediately; the owner feeds the results back
//! through the `on_*` callbacks.
//!
//! # States
//!
//! ```text
//!            load/revert                  save / auto-save
//!   Normal ───────────────► Loading ◄─┐  Normal ─────────► Saving
//!     ▲  ▲                  Reverting │    ▲                │ │
//!     │  │      success/soft error │  │    │   success      │ │ error
//!     │  └─────────────────────────┘  │    ├────────────────┘ ▼
//!     │                               │    │             SavingError
//!     │  hard error ──► LoadingError ─┘    │   retry ◄────────┘ │
//!     │               RevertingError       └───── dismiss ◄─────┘
//!     │
//!     └── print ──► Printing / PrintPreviewing ──► ShowingPrintPreview
//! ```
//!
//! Contract violations (starting an operation in a state that does not
//! allow it) return `Err` and leave the tab untouched. I/O failures never
//! do: they are classified and handled inside the state machine.

mod auto_save;
mod load;
mod print;
mod respond;
mod save;
mod tab;

#[cfg(test)]
mod test_support;

pub use auto_save::{AutoSaveTimer, AUTO_SAVE_RETRY_DELAY};
pub use tab::{Tab, TabSettings, MAX_NAME_LENGTH};
