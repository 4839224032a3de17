//! Text helpers for titles and status messages.

use unicode_segmentation::UnicodeSegmentation;

pub const ELLIPSIS: &str = "…";

/// Shorten `text` to at most `max_len` grapheme clusters by replacing
/// its middle with an ellipsis.
pub fn middle_truncate(text: &str, max_len: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max_len {
        return text.to_string();
    }
    if max_len == 0 {
        return String::new();
    }

    let kept = max_len - 1;
    let left = kept / 2;
    let right = kept - left;
    let mut result = graphemes[..left].concat();
    result.push_str(ELLIPSIS);
    result.push_str(&graphemes[graphemes.len() - right..].concat());
    result
}
