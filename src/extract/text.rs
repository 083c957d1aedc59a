//! Text clean-up shared by the field extractors

/// Drops every character outside the ASCII range
///
/// Accented letters are removed rather than transliterated ("BÁSICOS"
/// becomes "BSICOS"); downstream consumers already expect that output.
pub fn strip_non_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// Trims surrounding whitespace, then strips non-ASCII characters
pub fn clean_fragment(text: &str) -> String {
    strip_non_ascii(text.trim())
}
