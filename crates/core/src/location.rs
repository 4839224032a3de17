//! Resolved document locations.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

/// Where a document lives, as an absolute URL.
///
/// Two tabs showing the same file compare equal through their locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Parse a URL (`file:///...`, `sftp://...`) or a filesystem path.
    ///
    /// Relative paths are resolved against the current directory.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("Empty location");
        }

        if input.contains("://") {
            let url = Url::parse(input).with_context(|| format!("Malformed location: {}", input))?;
            if url.scheme() == "file" && url.to_file_path().is_err() {
                bail!("Malformed file location: {}", input);
            }
            return Ok(Self { url });
        }

        Self::from_path(Path::new(input))
    }

    /// Build a location from a filesystem path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .context("Failed to determine current directory")?
                .join(path)
        };
        let url = Url::from_file_path(&absolute)
            .map_err(|()| anyhow!("Malformed path: {}", path.display()))?;
        Ok(Self { url })
    }

    /// Whether the location is on the local filesystem.
    pub fn is_local(&self) -> bool {
        self.url.scheme() == "file"
    }

    /// Filesystem path for local locations.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if !self.is_local() {
            return None;
        }
        self.url.to_file_path().ok()
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Short name for titles: the file name.
    pub fn display_name(&self) -> String {
        if let Some(name) = self
            .to_file_path()
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
        {
            return name;
        }
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.url.to_string())
    }

    /// Containing directory, for progress and tooltip text.
    pub fn parent_display(&self) -> String {
        if let Some(path) = self.to_file_path() {
            return path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "/".to_string());
        }
        self.url
            .join("./")
            .map(|u| u.to_string())
            .unwrap_or_else(|_| self.url.to_string())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_file_path() {
            Some(path) => write!(f, "{}", path.display()),
            None => f.write_str(self.url.as_str()),
        }
    }
}
