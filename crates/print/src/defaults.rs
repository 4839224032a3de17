//! Process-wide print defaults with lazy loading and persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{PageSetup, PrintSettings};

pub const PAGE_SETUP_FILE: &str = "page-setup.toml";
pub const PRINT_SETTINGS_FILE: &str = "print-settings.toml";

/// Last-used page setup and print settings shared by every tab.
///
/// Values are loaded from `dir` on first access and handed out as
/// copies, so callers never mutate the shared original.
#[derive(Debug)]
pub struct PrintDefaults {
    dir: PathBuf,
    page_setup: Option<PageSetup>,
    print_settings: Option<PrintSettings>,
}

impl PrintDefaults {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            page_setup: None,
            print_settings: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn page_setup(&mut self) -> PageSetup {
        let path = self.dir.join(PAGE_SETUP_FILE);
        self.page_setup
            .get_or_insert_with(|| load_or_default(&path))
            .clone()
    }

    pub fn set_page_setup(&mut self, setup: PageSetup) {
        self.page_setup = Some(setup);
    }

    pub fn print_settings(&mut self) -> PrintSettings {
        let path = self.dir.join(PRINT_SETTINGS_FILE);
        self.print_settings
            .get_or_insert_with(|| load_or_default(&path))
            .clone()
    }

    pub fn set_print_settings(&mut self, settings: PrintSettings) {
        self.print_settings = Some(settings);
    }

    /// Write whichever values were accessed or set during the session.
    pub fn save(&self) -> Result<()> {
        if self.page_setup.is_none() && self.print_settings.is_none() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        if let Some(setup) = &self.page_setup {
            write_toml(setup, &self.dir.join(PAGE_SETUP_FILE))?;
        }
        if let Some(settings) = &self.print_settings {
            write_toml(settings, &self.dir.join(PRINT_SETTINGS_FILE))?;
        }
        Ok(())
    }
}

/// Read a persisted value, falling back to the default.
///
/// A missing file is the normal first-run case and is not reported.
fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Ignoring malformed {}: {}", path.display(), e);
                T::default()
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("{} not found, using defaults", path.display());
            T::default()
        }
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            T::default()
        }
    }
}

fn write_toml<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(value)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
