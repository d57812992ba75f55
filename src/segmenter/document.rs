//! Text extraction from uploaded documents.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Pdf,
}

impl DocumentFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" | "md" | "markdown" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Extract the text of a document.
///
/// PDF pages are joined with blank lines so the chunker sees page ends as
/// paragraph breaks.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String> {
    let pages = match format {
        DocumentFormat::Text => vec![String::from_utf8_lossy(bytes).into_owned()],
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| PipelineError::Document(e.to_string()))?,
    };

    let text = pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if text.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    log::debug!("Extracted {} characters from {:?} document", text.chars().count(), format);
    Ok(text)
}
