//! Comment stripping for contract sources.
//!
//! Line comments run from `//` to the end of the line (the newline itself is
//! kept); block comments run from `/*` to the nearest `*/`. This is a lexical
//! pass, not a parser: comment markers inside string literals are removed too.

use once_cell::sync::Lazy;
use regex::Regex;

/// Line comment, or the shortest `/* ... */` span (which may cross lines).
static COMMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)//[^\n]*|/\*.*?\*/").expect("Failed to compile comment regex")
});

/// Remove all single-line and block comments from `source`.
///
/// One pass is a fixed point, so `normalize(normalize(s)) == normalize(s)`:
/// every removed span starts with `/`, and a kept `/` right before it would
/// have opened a `//` match first.
pub fn normalize(source: &str) -> String {
    COMMENT_REGEX.replace_all(source, "").into_owned()
}
