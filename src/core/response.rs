//! Splitting replies to fit the Discord message size limit
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Drop embed helpers, replies are plain text
//! - 1.0.0: Line-aware UTF-8 safe chunking

/// Discord message content limit (bytes)
pub const MESSAGE_LIMIT: usize = 2000;

/// Split `text` into pieces no longer than `max_size` bytes.
///
/// Prefers newline boundaries; a single line that is too long on its own is
/// cut on character boundaries so multi-byte characters are never split.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        // +1 for the newline that joins it to the previous line
        let needed = if current.is_empty() { line.len() } else { line.len() + 1 };

        if current.len() + needed <= max_size {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if line.len() > max_size {
            let mut pieces = split_on_char_boundaries(line, max_size);
            // The last piece may still have room for following lines
            if let Some(tail) = pieces.pop() {
                chunks.extend(pieces);
                current = tail;
            }
        } else {
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_on_char_boundaries(line: &str, max_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for ch in line.chars() {
        if current.len() + ch.len_utf8() > max_size && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Chunk text for message content (2000 byte limit)
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Truncate to the message limit, ending in an ellipsis when cut
pub fn truncate_for_message(text: &str) -> String {
    if text.len() <= MESSAGE_LIMIT {
        return text.to_string();
    }
    let mut end = MESSAGE_LIMIT - 3;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(chunk_text("hello", 100), vec!["hello"]);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(chunk_text("", 100), vec![""]);
    }

    #[test]
    fn test_exactly_at_limit() {
        let text = "a".repeat(100);
        let chunks = chunk_text(&text, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 100);
    }

    #[test]
    fn test_splits_on_lines() {
        let chunks = chunk_text("line1\nline2\nline3", 12);
        assert_eq!(chunks, vec!["line1\nline2", "line3"]);
    }

    #[test]
    fn test_long_line_is_cut() {
        let chunks = chunk_text(&"a".repeat(100), 30);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() <= 30));
        assert_eq!(chunks.concat().len(), 100);
    }

    #[test]
    fn test_message_limit_respected_with_multibyte() {
        let text = "Hello 世界! ".repeat(500);
        let chunks = chunk_for_message(&text);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.len() <= MESSAGE_LIMIT);
        }
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_truncate_for_message() {
        assert_eq!(truncate_for_message("short"), "short");
        let truncated = truncate_for_message(&"é".repeat(3000));
        assert!(truncated.len() <= MESSAGE_LIMIT);
        assert!(truncated.ends_with("..."));
    }
}
