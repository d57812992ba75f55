//! Card generation error types

use thiserror::Error;

use crate::llm::ModelBackendError;

/// Errors that can end a generation run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No text could be extracted from the source")]
    EmptyInput,

    #[error("Document could not be read: {0}")]
    Document(String),

    #[error("The outline for the topic was empty")]
    EmptyOutline,

    #[error("No outline entry could be expanded")]
    EmptyExpansion,

    #[error("Failed to expand concept {index}: {source}")]
    ConceptExpansion {
        index: usize,
        #[source]
        source: ModelBackendError,
    },

    #[error("No valid JSON found in response")]
    NoValidJson,

    #[error(transparent)]
    ModelBackend(#[from] ModelBackendError),

    #[error("No cards were generated")]
    NoCardsGenerated,
}

/// Result type alias for generation operations
pub type Result<T> = std::result::Result<T, PipelineError>;
