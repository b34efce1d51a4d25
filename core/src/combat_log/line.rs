//! Line and name normalization ahead of classification.
//!
//! The client writes NBSP variants inside numbers ("12 345" with a
//! narrow no-break space as the thousands separator) and occasionally
//! dumps stack traces into the log. Everything downstream assumes
//! composed Unicode, ASCII spaces, and ungrouped digit runs.

use unicode_normalization::UnicodeNormalization;

const SPACE_VARIANTS: [char; 4] = ['\u{00A0}', '\u{202F}', '\u{2007}', '\u{2009}'];

fn plain_space(c: char) -> char {
    if SPACE_VARIANTS.contains(&c) { ' ' } else { c }
}

/// Full line normalization: NFC compose, space-variant replacement,
/// thousands-separator removal inside digit runs, repeated-space
/// collapse.
pub fn normalize_line(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.nfc().map(plain_space).peekable();
    let mut prev: Option<char> = None;
    while let Some(c) = chars.next() {
        if c == ' ' {
            // grouping separator between two digits joins the run
            if prev.is_some_and(|p| p.is_ascii_digit())
                && chars.peek().is_some_and(|n| n.is_ascii_digit())
            {
                continue;
            }
            if prev == Some(' ') {
                continue;
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Entity-name normalization: same as [`normalize_line`] minus the
/// digit-run collapse, plus trimming.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev: Option<char> = None;
    for c in raw.nfc().map(plain_space) {
        if c == ' ' && prev == Some(' ') {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out.trim().to_string()
}

/// Whitespace-only lines and embedded diagnostic dumps are dropped
/// before classification so frame text is never mistaken for combat
/// data.
pub fn is_noise(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || looks_like_stack_trace(trimmed)
}

fn looks_like_stack_trace(line: &str) -> bool {
    if line.starts_with("at ") || line.starts_with("---") {
        return true;
    }
    line.split_whitespace()
        .next()
        .is_some_and(|word| word.ends_with("Exception") || word.ends_with("Exception:"))
}
