//! Process-wide registry of quire.
//!
//! `App` owns every window, the document I/O backend, the lockdown mask and
//! the print defaults shared by all tabs. It is created explicitly with
//! [`App::init`] and torn down with [`App::shutdown`]; at most one instance
//! lives on the event loop thread at a time.
//!
//! # Event loop
//!
//! ```text
//!   ┌──────────── App::pump(now) ─────────────┐
//!   │ 1. drain DocumentIo messages → tabs     │
//!   │ 2. fire due auto-save timers            │
//!   │ 3. remove tabs that asked to close      │
//!   │ 4. collect window events → AppEvent     │
//!   └─────────────────────────────────────────┘
//! ```

mod app;

pub use app::App;
