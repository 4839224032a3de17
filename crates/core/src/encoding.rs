//! Character encodings and line terminators.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;

/// Character encoding of a document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1, every byte maps to the code point of the same value.
    Latin1,
    Ascii,
}

impl Encoding {
    /// Canonical charset name.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Ascii => "US-ASCII",
        }
    }

    /// Whether `ch` can be written in this encoding.
    pub fn can_encode(self, ch: char) -> bool {
        match self {
            Encoding::Utf8 => true,
            Encoding::Latin1 => (ch as u32) <= 0xFF,
            Encoding::Ascii => ch.is_ascii(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Ok(Encoding::Utf8),
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" | "LATIN-1" => Ok(Encoding::Latin1),
            "US-ASCII" | "ASCII" => Ok(Encoding::Ascii),
            _ => bail!("Unknown encoding: {}", s),
        }
    }
}

/// Line terminator used when writing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NewlineType {
    #[default]
    Lf,
    Cr,
    CrLf,
}

impl NewlineType {
    pub fn as_str(self) -> &'static str {
        match self {
            NewlineType::Lf => "\n",
            NewlineType::Cr => "\r",
            NewlineType::CrLf => "\r\n",
        }
    }

    /// Detect the terminator from the first line break in `text`.
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        match bytes.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(i) if bytes[i] == b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    NewlineType::CrLf
                } else {
                    NewlineType::Cr
                }
            }
            _ => NewlineType::Lf,
        }
    }
}
