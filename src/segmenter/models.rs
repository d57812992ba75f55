//! Data models for segmentation.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Default target chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

/// A slice of source text submitted to the model as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Position of this unit within its run (for ordering and logging)
    pub index: usize,
    /// The text content of the unit
    pub content: String,
    /// Character range in the extracted document, for document chunks
    pub span: Option<Range<usize>>,
}

impl TextUnit {
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        Self {
            index,
            content: content.into(),
            span: None,
        }
    }

    pub fn with_span(index: usize, content: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            index,
            content: content.into(),
            span: Some(span),
        }
    }
}

/// Chunking parameters, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}
