//! Line normalization shared by diffing and merging.

/// Characters treated as trailing whitespace on a line.
///
/// `\r` is included so CRLF content normalizes the same as LF content.
pub const TRAILING_WHITESPACE: [char; 3] = [' ', '\t', '\r'];

/// `line` without its trailing spaces, tabs and carriage returns.
pub fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(TRAILING_WHITESPACE)
}

/// Trim every `\n`-separated line of `text`, keeping the line structure.
pub fn trim_lines(text: &str) -> String {
    text.split('\n').map(trim_line_end).collect::<Vec<_>>().join("\n")
}
