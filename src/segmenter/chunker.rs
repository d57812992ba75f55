//! Splitting extracted text into overlapping chunks.
//!
//! Sizes and offsets are counted in characters so multi-byte text never gets
//! cut inside a code point.

use super::models::{ChunkConfig, TextUnit};

/// Sentence terminators, tried together; the last one in the window wins.
const SENTENCE_BREAKS: [&str; 6] = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

/// Split text into overlapping chunks.
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<TextUnit> {
    let chars: Vec<char> = text.chars().collect();

    sliding_window(&chars, config.chunk_size, config.overlap)
        .into_iter()
        .enumerate()
        .map(|(index, (content, start, end))| TextUnit::with_span(index, content, start..end))
        .collect()
}

/// Split text into overlapping chunks using a sliding window approach.
/// Returns tuples of (chunk_text, start_offset, end_offset).
fn sliding_window(chars: &[char], max_chars: usize, overlap: usize) -> Vec<(String, usize, usize)> {
    if max_chars == 0 || chars.iter().all(|c| c.is_whitespace()) {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + max_chars).min(chars.len());

        let chunk_end = if end < chars.len() {
            find_break_point(&chars[start..end])
                .map(|offset| start + offset)
                .unwrap_or(end)
        } else {
            end
        };

        let chunk_text: String = chars[start..chunk_end].iter().collect();
        let chunk_text = chunk_text.trim();
        if !chunk_text.is_empty() {
            chunks.push((chunk_text.to_string(), start, chunk_end));
        }

        if chunk_end >= chars.len() {
            break;
        }

        // Move start position, accounting for overlap
        let step = chunk_end - start;
        if step <= overlap {
            // Avoid stalling when the chunk is smaller than the overlap
            start = chunk_end;
        } else {
            start = chunk_end - overlap;
        }
    }

    chunks
}

/// Find a break point in a window: paragraph, then sentence, then word.
/// Returns the offset just past the separator.
fn find_break_point(window: &[char]) -> Option<usize> {
    let min_pos = window.len() / 3;

    if let Some(pos) = rfind(window, "\n\n") {
        if pos > min_pos {
            return Some(pos + 2);
        }
    }

    let sentence = SENTENCE_BREAKS
        .iter()
        .filter_map(|pattern| rfind(window, pattern).map(|pos| pos + pattern.chars().count()))
        .max();
    if let Some(end) = sentence {
        if end > min_pos {
            return Some(end);
        }
    }

    window
        .iter()
        .rposition(|c| c.is_whitespace())
        .filter(|&pos| pos > 0)
        .map(|pos| pos + 1)
}

/// Position of the last occurrence of `pattern` in `haystack`.
fn rfind(haystack: &[char], pattern: &str) -> Option<usize> {
    let needle: Vec<char> = pattern.chars().collect();
    if needle.len() > haystack.len() {
        return None;
    }

    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == needle[..])
}
