//! Paths arriving as a bracketed paste when a file is dragged onto the terminal.

use std::path::PathBuf;

use url::Url;

/// The first path in a drop. Terminals quote, escape or URL-encode paths differently.
pub(crate) fn parse_dropped_path(text: &str) -> Option<PathBuf> {
    let first = text.lines().map(str::trim).find(|line| !line.is_empty())?;

    if first.starts_with("file://") {
        return Url::parse(first).ok()?.to_file_path().ok();
    }

    let unquoted = strip_quotes(first);
    let path = if unquoted.len() == first.len() {
        unescape_spaces(first)
    } else {
        unquoted.to_string()
    };
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

fn unescape_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && matches!(chars.peek(), Some(' ' | '(' | ')' | '\'' | '&')) {
            continue;
        }
        out.push(ch);
    }
    out
}
