//! Identifiers for tabs and windows.
//!
//! Windows refer to their active tab and the app refers to its active
//! window through these ids, never through references. The owner looks
//! the id up on use and clears it when the referenced object goes away.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $counter:ident, $prefix:literal) => {
        static $counter: AtomicU64 = AtomicU64::new(1);

        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Allocate a fresh id, unique for the lifetime of the process.
            pub fn next() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            /// Raw numeric value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a tab.
    TabId,
    NEXT_TAB_ID,
    "tab"
);

define_id!(
    /// Identifier of a top-level window.
    WindowId,
    NEXT_WINDOW_ID,
    "window"
);
