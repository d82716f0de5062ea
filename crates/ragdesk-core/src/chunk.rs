//! Line-boundary text chunker with overlap.
//!
//! Splits merged document text into chunks of at most `chunk_size`
//! characters, carrying trailing lines of each chunk into the next one so
//! that context is not lost at boundaries.
//!
//! # Algorithm
//!
//! 1. Split text on `\n` into lines; empty lines are dropped.
//! 2. Accumulate lines (re-joined with `\n`) until adding the next line
//!    would exceed `chunk_size`.
//! 3. When exceeded, emit the buffer as a chunk, then drop leading lines
//!    until what remains fits within `chunk_overlap` and leaves room for the
//!    next line. The surviving lines start the next chunk.
//! 4. A single line longer than `chunk_size` becomes its own oversized
//!    chunk; lines are never split internally.
//!
//! Lengths are counted in characters, not bytes.
//!
//! # Example
//!
//! ```rust
//! use ragdesk_core::chunk::{split_text, ChunkParams};
//!
//! let chunks = split_text("The cat sat.\nThe dog ran.", &ChunkParams::default());
//! assert_eq!(chunks, vec!["The cat sat.\nThe dog ran.".to_string()]);
//! ```

use anyhow::{bail, Result};
use std::collections::VecDeque;
use tracing::{debug, warn};

const SEPARATOR: &str = "\n";
const SEPARATOR_LEN: usize = 1;

/// Chunk sizing, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    /// Maximum characters per chunk (oversized single lines excepted).
    pub chunk_size: usize,
    /// Characters of trailing context carried into the next chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

impl ChunkParams {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be > 0");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        Ok(())
    }
}

/// Split `text` into overlapping chunks.
///
/// Pure and deterministic. Empty or whitespace-only input yields no chunks.
pub fn split_text(text: &str, params: &ChunkParams) -> Vec<String> {
    let units: Vec<&str> = text.split(SEPARATOR).filter(|u| !u.is_empty()).collect();

    let mut chunks = Vec::new();
    let mut current: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0usize;

    for unit in units {
        let len = unit.chars().count();
        let joined_len = |total: usize, buffered: usize| {
            total + len + if buffered > 0 { SEPARATOR_LEN } else { 0 }
        };

        if joined_len(total, current.len()) > params.chunk_size {
            if total > params.chunk_size {
                warn!(
                    chars = total,
                    chunk_size = params.chunk_size,
                    "emitting chunk larger than chunk_size"
                );
            }
            if !current.is_empty() {
                push_joined(&mut chunks, &current);

                while total > params.chunk_overlap
                    || (joined_len(total, current.len()) > params.chunk_size && total > 0)
                {
                    let Some((_, first_len)) = current.pop_front() else {
                        break;
                    };
                    let sep = if current.is_empty() { 0 } else { SEPARATOR_LEN };
                    total -= first_len + sep;
                }
            }
        }

        let sep = if current.is_empty() { 0 } else { SEPARATOR_LEN };
        current.push_back((unit, len));
        total += len + sep;
    }

    if total > params.chunk_size {
        warn!(
            chars = total,
            chunk_size = params.chunk_size,
            "emitting chunk larger than chunk_size"
        );
    }
    push_joined(&mut chunks, &current);

    debug!(
        chunks = chunks.len(),
        chunk_size = params.chunk_size,
        chunk_overlap = params.chunk_overlap,
        "split text"
    );
    chunks
}

fn push_joined(chunks: &mut Vec<String>, units: &VecDeque<(&str, usize)>) {
    let joined = units
        .iter()
        .map(|(u, _)| *u)
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> String {
        (0..n)
            .map(|i| format!("Line number {:02} here.", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_small_text_single_chunk() {
        let text = "The cat sat on the mat.\nThe dog ran in the park.";
        let chunks = split_text(text, &ChunkParams::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(split_text("", &ChunkParams::default()).is_empty());
        assert!(split_text("  \n\n \t\n", &ChunkParams::default()).is_empty());
    }

    #[test]
    fn test_blank_lines_dropped() {
        let chunks = split_text("alpha\n\nbeta", &ChunkParams::default());
        assert_eq!(chunks, vec!["alpha\nbeta".to_string()]);
    }

    #[test]
    fn test_chunks_respect_size() {
        // each line is 22 chars
        let text = lines(40);
        let params = ChunkParams::new(100, 30);
        let chunks = split_text(&text, &params);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 100, "chunk too long: {}", c.len());
        }
    }

    #[test]
    fn test_overlap_carries_trailing_lines() {
        let text = lines(40);
        let params = ChunkParams::new(100, 30);
        let chunks = split_text(&text, &params);
        for pair in chunks.windows(2) {
            let last_line = pair[0].lines().last().unwrap();
            assert!(
                pair[1].starts_with(last_line),
                "expected {:?} to start with {:?}",
                pair[1],
                last_line
            );
        }
    }

    #[test]
    fn test_zero_overlap_no_repeats() {
        let text = lines(20);
        let chunks = split_text(&text, &ChunkParams::new(50, 0));
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.lines()).collect();
        let original: Vec<&str> = text.lines().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_every_line_covered_in_order() {
        let text = lines(57);
        let chunks = split_text(&text, &ChunkParams::new(120, 40));
        let mut seen: Vec<&str> = Vec::new();
        for c in &chunks {
            for l in c.lines() {
                if seen.last() != Some(&l) && !seen.contains(&l) {
                    seen.push(l);
                }
            }
        }
        let original: Vec<&str> = text.lines().collect();
        assert_eq!(seen, original);
    }

    #[test]
    fn test_oversized_line_kept_whole() {
        let long = "x".repeat(80);
        let text = format!("short one\n{}\nshort two", long);
        let chunks = split_text(&text, &ChunkParams::new(30, 5));
        assert!(chunks.contains(&long));
        assert!(chunks.iter().any(|c| c.contains("short one")));
        assert!(chunks.iter().any(|c| c.contains("short two")));
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // 10 chars, 30 bytes
        let korean = "가나다라마바사아자차";
        let text = format!("{}\n{}", korean, korean);
        let chunks = split_text(&text, &ChunkParams::new(21, 0));
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_deterministic() {
        let text = lines(30);
        let params = ChunkParams::new(64, 20);
        assert_eq!(split_text(&text, &params), split_text(&text, &params));
    }

    #[test]
    fn test_validate() {
        assert!(ChunkParams::default().validate().is_ok());
        assert!(ChunkParams::new(0, 0).validate().is_err());
        assert!(ChunkParams::new(100, 100).validate().is_err());
        assert!(ChunkParams::new(100, 99).validate().is_ok());
    }
}
