//! Reply text utilities
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Add markdown escaping for echoed user input
//! - 1.0.0: Line-aware reply splitting for the message length limit

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Split reply text into messages no longer than `max_len` bytes
///
/// Splits on newlines where possible and falls back to character boundaries for
/// lines that do not fit on their own.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut messages = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        let needed = if current.is_empty() { line.len() } else { line.len() + 1 };
        if current.len() + needed <= max_len {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            continue;
        }

        if !current.is_empty() {
            messages.push(std::mem::take(&mut current));
        }

        if line.len() <= max_len {
            current.push_str(line);
        } else {
            let mut pieces = split_on_chars(line, max_len);
            // the tail may still share a message with the next line
            if let Some(last) = pieces.pop() {
                messages.extend(pieces);
                current = last;
            }
        }
    }

    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

fn split_on_chars(line: &str, max_len: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in line.chars() {
        if piece.len() + ch.len_utf8() > max_len && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
        }
        piece.push(ch);
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Escape markdown control characters so user input is echoed literally
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '*' | '_' | '`' | '~' | '|' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_reply_is_untouched() {
        assert_eq!(split_message("pong", 10), vec!["pong"]);
    }

    #[test]
    fn test_splits_on_lines() {
        let parts = split_message("aaaa\nbbbb\ncccc", 9);
        assert_eq!(parts, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_long_line_is_split_on_chars() {
        let parts = split_message("abcdefghij", 4);
        assert_eq!(parts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_multibyte_boundaries_are_respected() {
        let text = "é".repeat(10);
        for part in split_message(&text, 5) {
            assert!(part.len() <= 5);
            assert!(part.chars().all(|c| c == 'é'));
        }
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("*hi* `x`"), "\\*hi\\* \\`x\\`");
    }
}
