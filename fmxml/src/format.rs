//! Translation of FileMaker date/time format strings into chrono patterns.
//!
//! The Web Publishing Engine reports its formats as `MM/dd/yyyy`,
//! `HH:mm:ss` and `MM/dd/yyyy HH:mm:ss` on the `<datasource>` element.

use serde::Serialize;

pub const DEFAULT_DATE_FORMAT: &str = "MM/dd/yyyy";
pub const DEFAULT_TIME_FORMAT: &str = "HH:mm:ss";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "MM/dd/yyyy HH:mm:ss";

const TOKENS: &[(&str, &str)] = &[
    ("yyyy", "%Y"),
    ("MM", "%m"),
    ("dd", "%d"),
    ("HH", "%H"),
    ("mm", "%M"),
    ("ss", "%S"),
];

/// Converts a FileMaker format string into a strftime-style pattern.
///
/// Characters outside the known tokens are copied as literals; a literal `%`
/// is escaped so it survives chrono's parser.
pub fn translate(fm_pattern: &str) -> String {
    let mut pattern = String::with_capacity(fm_pattern.len() + 4);
    let mut rest = fm_pattern;

    'scan: while let Some(ch) = rest.chars().next() {
        for (token, replacement) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                pattern.push_str(replacement);
                rest = tail;
                continue 'scan;
            }
        }
        if ch == '%' {
            pattern.push_str("%%");
        } else {
            pattern.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }

    pattern
}

/// Date, time and timestamp patterns shared by every field of one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSet {
    pub date: String,
    pub time: String,
    pub timestamp: String,
}

impl FormatSet {
    /// Builds a format set from the FileMaker-style strings of a datasource.
    pub fn from_filemaker(date: &str, time: &str, timestamp: &str) -> Self {
        Self {
            date: translate(date),
            time: translate(time),
            timestamp: translate(timestamp),
        }
    }
}

impl Default for FormatSet {
    fn default() -> Self {
        Self::from_filemaker(DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, DEFAULT_TIMESTAMP_FORMAT)
    }
}
