//! Text helpers for the tagged line grammar.
//!
//! Comments are free text with embedded newlines, but the tag grammar is
//! strictly line-oriented. On write, each newline is replaced by the two
//! characters `\` `n`; on read the inverse transform restores them.

/// Convert a display comment to its single-line storage form.
///
/// Carriage returns are dropped so round-trips are stable across
/// platforms; each `\n` becomes the two-character escape `\n`.
pub fn comment_to_storage(comment: &str) -> String {
    let mut out = String::with_capacity(comment.len());
    for c in comment.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Convert a storage-form comment back to its display form.
pub fn comment_to_display(comment: &str) -> String {
    let mut out = String::with_capacity(comment.len());
    let mut chars = comment.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'n') {
            chars.next();
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a line into `(tag, rest)` at the first run of whitespace.
/// The rest is empty for a standalone tag line.
pub fn split_tag_line(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], line[pos..].trim_start()),
        None => (line, ""),
    }
}

/// Split a numbered tag value into `(column_index, remainder)`.
///
/// Column tags look like `tag-column-name 2 Sulcal Depth`; the value part
/// is everything after the index, whitespace preserved past the split.
pub fn split_column_value(value: &str) -> Option<(usize, &str)> {
    let value = value.trim_start();
    let (index, rest) = split_tag_line(value);
    let index = index.parse::<usize>().ok()?;
    Some((index, rest))
}

/// Tokenize a data row on runs of whitespace.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}
