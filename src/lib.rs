//! Flashcard generation with a local language model.
//!
//! A document or a topic is split into text units, each unit is sent to the
//! model with a field template, the replies are sanitized into cards, and a
//! reviewed set of cards is packaged as an Anki deck.

pub mod config;
pub mod error;
pub mod flashcards;
pub mod generation;
pub mod llm;
pub mod packager;
pub mod segmenter;
pub mod sync;

pub use config::{Config, ConfigError, Workspace};
pub use error::PipelineError;
pub use generation::{FlashcardGenerator, SanitizePolicy};
pub use packager::{DeckPackager, PackagingError};
