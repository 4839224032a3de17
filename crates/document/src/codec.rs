//! Byte and text conversion for supported encodings.

use quire_core::{Encoding, IoErrorKind, IoFailure, NewlineType};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Text decoded from disk, with line breaks normalized to `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: Encoding,
    pub newline: NewlineType,
    /// Some bytes were replaced by U+FFFD.
    pub lossy: bool,
}

/// Decode `bytes`. Without an explicit encoding, UTF-8 is tried first
/// and ISO-8859-1 accepts anything else.
pub fn decode(bytes: &[u8], encoding: Option<Encoding>) -> DecodedText {
    let (raw, encoding, lossy) = match encoding {
        None => match std::str::from_utf8(strip_bom(bytes)) {
            Ok(text) => (text.to_string(), Encoding::Utf8, false),
            Err(_) => (decode_latin1(bytes), Encoding::Latin1, false),
        },
        Some(Encoding::Utf8) => {
            let text = String::from_utf8_lossy(strip_bom(bytes));
            let lossy = matches!(text, std::borrow::Cow::Owned(_));
            (text.into_owned(), Encoding::Utf8, lossy)
        }
        Some(Encoding::Latin1) => (decode_latin1(bytes), Encoding::Latin1, false),
        Some(Encoding::Ascii) => {
            let lossy = !bytes.is_ascii();
            let text: String = bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
                .collect();
            (text, Encoding::Ascii, lossy)
        }
    };

    let newline = NewlineType::detect(&raw);
    DecodedText {
        text: normalize_newlines(&raw),
        encoding,
        newline,
        lossy,
    }
}

/// Encode `text` for writing, converting `\n` to `newline`.
pub fn encode(text: &str, encoding: Encoding, newline: NewlineType) -> Result<Vec<u8>, IoFailure> {
    if let Some((line, ch)) = text
        .lines()
        .enumerate()
        .find_map(|(i, l)| l.chars().find(|&c| !encoding.can_encode(c)).map(|c| (i + 1, c)))
    {
        return Err(IoFailure::new(
            IoErrorKind::ConversionFailed,
            format!(
                "Character '{}' on line {} cannot be represented in {}",
                ch, line, encoding
            ),
        ));
    }

    let text = if newline == NewlineType::Lf {
        text.to_string()
    } else {
        text.replace('\n', newline.as_str())
    };

    Ok(match encoding {
        Encoding::Utf8 => text.into_bytes(),
        Encoding::Latin1 | Encoding::Ascii => text.chars().map(|c| c as u8).collect(),
    })
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
