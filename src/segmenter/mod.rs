//! Source segmentation: turning a document or a topic into text units.

mod chunker;
mod document;
mod models;
mod topic;

pub use chunker::split_text;
pub use document::{extract_text, DocumentFormat};
pub use models::{ChunkConfig, TextUnit, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use topic::{build_outline, expand_topic, expansion_parameters, outline_parameters};

use crate::error::{PipelineError, Result};

/// Extract a document and split it into chunks.
pub fn segment_document(bytes: &[u8], format: DocumentFormat, config: &ChunkConfig) -> Result<Vec<TextUnit>> {
    let text = extract_text(bytes, format)?;
    let units = split_text(&text, config);
    if units.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    log::info!("Segmented document into {} chunks", units.len());
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_text_document() {
        let text = "Cells are the basic unit of life. ".repeat(60);
        let units = segment_document(text.as_bytes(), DocumentFormat::Text, &ChunkConfig::default()).unwrap();
        assert!(units.len() >= 3);
        assert!(units.iter().enumerate().all(|(i, u)| u.index == i));
    }

    #[test]
    fn test_segment_empty_document() {
        assert!(matches!(
            segment_document(b"", DocumentFormat::Text, &ChunkConfig::default()),
            Err(PipelineError::EmptyInput)
        ));
    }
}
