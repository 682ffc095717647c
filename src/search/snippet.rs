//! Result snippets
//!
//! A snippet is a window of the page text around the first word matching the
//! query, HTML-escaped, with matched words wrapped in `<b>` tags.

use std::ops::Range;

const ELLIPSIS: &str = "...";

/// Builds a snippet of at most `max_chars` characters of page text
///
/// `matches` are byte ranges of matched words in `text`, in ascending order.
/// `text` is expected to be trimmed with whitespace collapsed to single spaces.
pub fn build_snippet(text: &str, matches: &[Range<usize>], max_chars: usize) -> String {
    if text.is_empty() || max_chars == 0 {
        return String::new();
    }

    let (start, end) = window(text, matches, max_chars);

    let mut snippet = String::with_capacity(end - start + 16);
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }

    let mut cursor = start;
    for m in matches
        .iter()
        .filter(|m| m.start >= start && m.end <= end)
    {
        snippet.push_str(&html_escape::encode_text(&text[cursor..m.start]));
        snippet.push_str("<b>");
        snippet.push_str(&html_escape::encode_text(&text[m.clone()]));
        snippet.push_str("</b>");
        cursor = m.end;
    }
    snippet.push_str(&html_escape::encode_text(&text[cursor..end]));

    if end < text.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// Chooses the byte window of the snippet
///
/// The window starts a third of its length before the first match, is
/// pulled back when it would run past the end of the text, and both edges
/// are moved to word boundaries without dropping the first match.
fn window(text: &str, matches: &[Range<usize>], max_chars: usize) -> (usize, usize) {
    let total_chars = text.chars().count();
    let first = matches.first().cloned().unwrap_or(0..0);
    let first_char = text[..first.start].chars().count();

    let mut start_char = first_char.saturating_sub(max_chars / 3);
    let end_char = (start_char + max_chars).min(total_chars);
    if end_char - start_char < max_chars {
        start_char = end_char.saturating_sub(max_chars);
    }

    let mut start = byte_offset(text, start_char);
    let mut end = byte_offset(text, end_char);

    if start > 0 && start < first.start && !text[..start].ends_with(' ') {
        if let Some(space) = text[start..first.start].find(' ') {
            start += space + 1;
        }
    }
    if end < text.len() && end > first.end && !text[end..].starts_with(' ') {
        if let Some(space) = text[first.end..end].rfind(' ') {
            end = first.end + space;
        }
    }

    (start, end)
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
