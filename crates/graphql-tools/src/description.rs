//! Recover descriptions from comments written above a definition
//!
//! The AST keeps no trace of `#` comments, so the description of a field,
//! argument, or variable that has no SDL description is taken from the comment
//! that sits between its parent's start and its own start in the source text.

use std::ops::Range;

use apollo_compiler::Node;

const BLOCK_QUOTE: &str = "\"\"\"";

/// Byte offset where a node starts in its source file
pub fn node_start<T>(node: &Node<T>) -> Option<usize> {
    node.location().map(|span| span.offset())
}

/// Find the comment directly preceding `node_start`, searching back no further than `parent_start`.
///
/// Consecutive `#` lines are joined with newlines. A trailing `"""` block is
/// returned without its quotes.
pub fn resolve(
    source: &str,
    node_start: Option<usize>,
    parent_start: Option<usize>,
) -> Option<String> {
    let (node_start, parent_start) = (node_start?, parent_start?);
    let node_start = skip_trivia(source, node_start);
    let preceding = source.get(parent_start..node_start)?.trim();

    if let Some(block) = preceding.strip_suffix(BLOCK_QUOTE) {
        let opening = block.rfind(BLOCK_QUOTE)?;
        let text = block.get(opening + BLOCK_QUOTE.len()..)?.trim();
        return (!text.is_empty()).then(|| text.to_string());
    }

    let mut lines: Vec<&str> = preceding
        .lines()
        .rev()
        .map(str::trim)
        .take_while(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim())
        .collect();
    lines.reverse();

    let text = lines.join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Move past whitespace, commas, and comments so that comments owned by a node's own span
/// are still found when its reported start is before them.
pub(crate) fn skip_trivia(source: &str, offset: usize) -> usize {
    let bytes = source.as_bytes();
    let mut position = offset;
    while let Some(&byte) = bytes.get(position) {
        match byte {
            b' ' | b'\t' | b'\r' | b'\n' | b',' => position += 1,
            b'#' => position = line_end(bytes, position),
            _ => break,
        }
    }
    position
}

/// Byte ranges of every `#` comment, ignoring `#` inside string literals
pub(crate) fn comment_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut position = 0;

    while let Some(&byte) = bytes.get(position) {
        match byte {
            b'#' => {
                let end = line_end(bytes, position);
                ranges.push(position..end);
                position = end;
            }
            b'"' if starts_with_at(bytes, position, BLOCK_QUOTE) => {
                position += BLOCK_QUOTE.len();
                loop {
                    match bytes.get(position) {
                        None => break,
                        Some(b'\\') if starts_with_at(bytes, position + 1, BLOCK_QUOTE) => {
                            position += 1 + BLOCK_QUOTE.len()
                        }
                        Some(b'"') if starts_with_at(bytes, position, BLOCK_QUOTE) => {
                            position += BLOCK_QUOTE.len();
                            break;
                        }
                        Some(_) => position += 1,
                    }
                }
            }
            b'"' => {
                position += 1;
                loop {
                    match bytes.get(position) {
                        None | Some(b'\n') => break,
                        Some(b'\\') => position += 2,
                        Some(b'"') => {
                            position += 1;
                            break;
                        }
                        Some(_) => position += 1,
                    }
                }
            }
            _ => position += 1,
        }
    }

    ranges
}

/// Remove comments, trailing whitespace, and the lines left blank
pub(crate) fn strip_comments(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in comment_ranges(text) {
        stripped.push_str(text.get(cursor..range.start).unwrap_or_default());
        cursor = range.end;
    }
    stripped.push_str(text.get(cursor..).unwrap_or_default());

    stripped
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Offset just past the last character of `range` that is neither whitespace nor comment
pub(crate) fn content_end(source: &str, range: Range<usize>) -> usize {
    let Some(text) = source.get(range.clone()) else {
        return range.end;
    };
    let comments = comment_ranges(text);
    let mut end = text.len();
    loop {
        end = text
            .get(..end)
            .map(|head| head.trim_end().len())
            .unwrap_or(end);
        match comments.iter().find(|comment| comment.contains(&end.saturating_sub(1))) {
            Some(comment) if end > 0 => end = comment.start,
            _ => break,
        }
    }
    range.start + end
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes
        .get(from..)
        .and_then(|rest| rest.iter().position(|byte| *byte == b'\n'))
        .map_or(bytes.len(), |offset| from + offset)
}

fn starts_with_at(bytes: &[u8], position: usize, needle: &str) -> bool {
    bytes
        .get(position..)
        .is_some_and(|rest| rest.starts_with(needle.as_bytes()))
}
