//! Page setup and print settings values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named paper size in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    pub name: String,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PaperSize {
    pub fn a4() -> Self {
        Self {
            name: "iso_a4".to_string(),
            width_mm: 210.0,
            height_mm: 297.0,
        }
    }

    pub fn letter() -> Self {
        Self {
            name: "na_letter".to_string(),
            width_mm: 215.9,
            height_mm: 279.4,
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Paper, orientation and margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    #[serde(default)]
    pub orientation: Orientation,

    #[serde(default = "default_margin")]
    pub top_margin_mm: f64,

    #[serde(default = "default_margin")]
    pub bottom_margin_mm: f64,

    #[serde(default = "default_margin")]
    pub left_margin_mm: f64,

    #[serde(default = "default_margin")]
    pub right_margin_mm: f64,

    #[serde(default)]
    pub paper: PaperSize,
}

fn default_margin() -> f64 {
    6.35
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            top_margin_mm: default_margin(),
            bottom_margin_mm: default_margin(),
            left_margin_mm: default_margin(),
            right_margin_mm: default_margin(),
            paper: PaperSize::default(),
        }
    }
}

/// Free-form printer settings, keyed like the print backend expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrintSettings {
    values: BTreeMap<String, String>,
}

impl PrintSettings {
    pub const N_COPIES: &'static str = "n-copies";
    pub const PRINTER: &'static str = "printer";
    pub const OUTPUT_URI: &'static str = "output-uri";
    pub const DUPLEX: &'static str = "duplex";

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn unset(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn n_copies(&self) -> Option<u32> {
        self.get(Self::N_COPIES).and_then(|v| v.parse().ok())
    }

    pub fn set_n_copies(&mut self, copies: u32) {
        self.set(Self::N_COPIES, copies.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy suitable for reuse by later jobs: the copy count is per job.
    pub fn without_copies(&self) -> Self {
        let mut settings = self.clone();
        settings.unset(Self::N_COPIES);
        settings
    }
}
