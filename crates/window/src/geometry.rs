//! Window placement and panel layout.

use quire_config::{defaults, WindowSettings};

/// Size and placement of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub maximized: bool,
    pub screen: u32,
    /// `None` for a window shown on every workspace.
    pub workspace: Option<u32>,
}

impl WindowGeometry {
    pub fn from_settings(settings: &WindowSettings) -> Self {
        Self {
            x: 0,
            y: 0,
            width: settings.width,
            height: settings.height,
            maximized: settings.maximized,
            screen: 0,
            workspace: Some(0),
        }
    }

    /// Geometry for a new window cloned from this one. Maximized windows
    /// hand down the default size and stay maximized.
    pub fn for_clone(&self) -> Self {
        let mut geometry = self.clone();
        if geometry.maximized {
            geometry.width = defaults::WINDOW_WIDTH;
            geometry.height = defaults::WINDOW_HEIGHT;
        }
        geometry
    }

    /// Whether most of the window is visible in `viewport`.
    ///
    /// At least three quarters of the width and the whole height must be
    /// inside.
    pub fn is_in_viewport(&self, viewport: &Viewport) -> bool {
        if self.screen != viewport.screen {
            return false;
        }
        if matches!(self.workspace, Some(ws) if ws != viewport.workspace) {
            return false;
        }

        let x = i64::from(self.x);
        let y = i64::from(self.y);
        let width = i64::from(self.width);
        let height = i64::from(self.height);
        let vx = i64::from(viewport.x);
        let vy = i64::from(viewport.y);

        x + width / 4 >= vx
            && x + width * 3 / 4 <= vx + i64::from(viewport.width)
            && y >= vy
            && y + height <= vy + i64::from(viewport.height)
    }
}

/// Visible area of one workspace on one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub screen: u32,
    pub workspace: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Panel and bar visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLayout {
    pub side_panel_visible: bool,
    pub side_panel_size: u32,
    pub bottom_panel_visible: bool,
    pub bottom_panel_size: u32,
    pub toolbar_visible: bool,
    pub statusbar_visible: bool,
}

impl PanelLayout {
    pub fn from_settings(settings: &WindowSettings) -> Self {
        Self {
            side_panel_visible: settings.side_panel_visible,
            side_panel_size: settings.side_panel_size,
            bottom_panel_visible: settings.bottom_panel_visible,
            bottom_panel_size: settings.bottom_panel_size,
            toolbar_visible: settings.toolbar_visible,
            statusbar_visible: settings.statusbar_visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            screen: 0,
            workspace: 0,
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        }
    }

    fn geometry(x: i32, y: i32) -> WindowGeometry {
        WindowGeometry {
            x,
            y,
            width: 800,
            height: 600,
            ..WindowGeometry::from_settings(&WindowSettings::default())
        }
    }

    #[test]
    fn test_window_inside_viewport() {
        assert!(geometry(100, 100).is_in_viewport(&viewport()));
    }

    #[test]
    fn test_quarter_overhang_is_tolerated() {
        // 200 of 800 pixels hang off the left edge.
        assert!(geometry(-200, 0).is_in_viewport(&viewport()));
        assert!(!geometry(-201, 0).is_in_viewport(&viewport()));
        assert!(geometry(1320, 0).is_in_viewport(&viewport()));
        assert!(!geometry(1321, 0).is_in_viewport(&viewport()));
    }

    #[test]
    fn test_height_must_fit() {
        assert!(!geometry(0, -1).is_in_viewport(&viewport()));
        assert!(!geometry(0, 481).is_in_viewport(&viewport()));
    }

    #[test]
    fn test_other_screen_or_workspace() {
        let mut g = geometry(0, 0);
        g.screen = 1;
        assert!(!g.is_in_viewport(&viewport()));

        let mut g = geometry(0, 0);
        g.workspace = Some(2);
        assert!(!g.is_in_viewport(&viewport()));
        g.workspace = None;
        assert!(g.is_in_viewport(&viewport()));
    }

    #[test]
    fn test_clone_of_maximized_uses_default_size() {
        let mut g = geometry(0, 0);
        g.maximized = true;
        let clone = g.for_clone();
        assert!(clone.maximized);
        assert_eq!(clone.width, defaults::WINDOW_WIDTH);
        assert_eq!(clone.height, defaults::WINDOW_HEIGHT);

        g.maximized = false;
        assert_eq!(g.for_clone().width, 800);
    }
}
