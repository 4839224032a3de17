//! Top-level window of quire.
//!
//! A `Window` owns an ordered list of tabs, tracks the active one and folds
//! their states into a coarse `WindowState` used to enable or disable
//! window-wide actions. Tab events are forwarded in emission order, followed
//! by the window events they cause.

mod geometry;
mod sensitivity;
mod window;

pub use geometry::{PanelLayout, Viewport, WindowGeometry};
pub use sensitivity::ActionSensitivity;
pub use window::Window;
