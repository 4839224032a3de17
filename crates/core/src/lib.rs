//! Core types shared by every quire crate.
//!
//! This crate holds the vocabulary of the document lifecycle without
//! any behaviour attached to it:
//! - identifiers for tabs and windows
//! - `TabState` and the aggregated `WindowState` bitmask
//! - lockdown and save flag bitmasks
//! - resolved document locations, encodings and newline types
//! - the closed `IoErrorKind` produced by the I/O boundary and its classification
//! - notices a tab asks the presentation layer to show, and their responses
//! - events emitted by tabs, windows and the app

pub mod encoding;
pub mod error;
pub mod event;
pub mod id;
pub mod location;
pub mod notice;
pub mod state;
pub mod text;

pub use encoding::{Encoding, NewlineType};
pub use error::{IoErrorKind, IoFailure, LoadErrorClass, SaveErrorClass};
pub use event::{AppEvent, TabEvent, WindowEvent};
pub use id::{TabId, WindowId};
pub use location::Location;
pub use notice::{Notice, NoticeResponse, ProgressKind};
pub use state::{Lockdown, SaveFlags, TabState, WindowState};
pub use text::middle_truncate;
