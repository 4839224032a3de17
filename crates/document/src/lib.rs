//! Documents and their asynchronous I/O.
//!
//! This crate provides:
//! - `Document`, the content and file metadata owned by one tab
//! - `DocumentIo`, the interface tabs use to load and save
//! - `FsDocumentIo`, which reads and writes local files on worker threads
//! - `MemoryDocumentIo`, an in-memory backend with scripted failures
//!
//! # Architecture
//!
//! Requests return immediately. Results come back as `IoMessage`s that the
//! event loop polls and hands to the owning tab:
//!
//! ```text
//! Tab ──LoadRequest/SaveRequest──► DocumentIo ──worker──┐
//!  ▲                                                     │
//!  └────────── IoMessage ◄── poll_messages() ◄───────────┘
//! ```

mod codec;
mod document;
mod file_io;
mod fs;
mod io;
mod memory;

pub mod constants;

pub use codec::{decode, encode, DecodedText};
pub use document::Document;
pub use fs::FsDocumentIo;
pub use io::{
    DiskStatus, DocumentIo, IoMessage, LoadOutcome, LoadRequest, LoadedContent, SaveRequest,
    SavedInfo,
};
pub use memory::{IoRequest, MemoryDocumentIo};
