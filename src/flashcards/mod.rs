//! Flashcard data model and persistence
//!
//! This module provides:
//! - Templates, generated cards and deck confirmation payloads
//! - Front/back field extraction strategies for packaging
//! - JSON stores for deck metadata and templates

pub mod extract;
pub mod models;
pub mod storage;

pub use extract::{fit_values, CardSides, DirectFields, FieldExtractor, MarkerFields};
pub use models::*;
pub use storage::{DeckStore, JsonStore, StoreError, TemplateStore};
