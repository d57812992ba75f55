//! Deck packaging: turning confirmed cards into an Anki package.

mod apkg;
mod render;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::flashcards::{
    generate_id, DeckArtifact, DeckSpec, DeckStore, FieldExtractor, MarkerFields, StoreError, TemplateError,
};

pub use apkg::{field_checksum, write_package, DeckContents, COLLECTION_ENTRY, MEDIA_ENTRY};
pub use render::{answer_template, question_template, NoteModel, CARD_CSS, CARD_TEMPLATE_NAME};

#[derive(Error, Debug)]
pub enum PackagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid template: {0}")]
    InvalidTemplate(#[from] TemplateError),

    #[error("Metadata store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PackagingError>;

/// File name for a packaged deck
pub fn package_file_name(deck_name: &str, deck_id: i64) -> String {
    let safe: String = deck_name
        .chars()
        .map(|c| if c == ' ' || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}_{}.apkg", safe, deck_id)
}

/// Builds deck packages and records them in a [`DeckStore`]
pub struct DeckPackager {
    store: DeckStore,
    raw_fields: Box<dyn FieldExtractor>,
}

impl DeckPackager {
    /// Packager that reads raw cards by marker words
    pub fn new(store: DeckStore) -> Self {
        Self::with_extractor(store, Box::new(MarkerFields::default()))
    }

    /// Packager with a custom strategy for raw cards
    pub fn with_extractor(store: DeckStore, raw_fields: Box<dyn FieldExtractor>) -> Self {
        Self { store, raw_fields }
    }

    pub fn store(&self) -> &DeckStore {
        &self.store
    }

    /// Package a confirmed deck and record its metadata.
    pub fn package(&self, spec: &DeckSpec) -> Result<DeckArtifact> {
        spec.template.validate()?;

        let deck_id = generate_id();
        let model = NoteModel::from_template(&spec.template);

        let notes = spec
            .cards
            .iter()
            .map(|card| model.note_values(card.sides(self.raw_fields.as_ref())))
            .collect();

        let contents = DeckContents {
            deck_id,
            deck_name: spec.name.clone(),
            model,
            notes,
        };

        let output_path: PathBuf = self
            .store
            .decks_dir()
            .join(package_file_name(&spec.name, deck_id));
        write_package(&contents, &output_path)?;

        // A package without a metadata record is unreachable; remove it
        let artifact = match self.record(spec, deck_id, &output_path) {
            Ok(artifact) => artifact,
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&output_path) {
                    log::warn!("Failed to remove unrecorded package {:?}: {}", output_path, remove_err);
                }
                return Err(e);
            }
        };

        log::info!(
            "Packaged deck {:?} ({} notes) at {}",
            artifact.deck_name,
            contents.notes.len(),
            artifact.file_path.display()
        );
        Ok(artifact)
    }

    fn record(&self, spec: &DeckSpec, deck_id: i64, output_path: &Path) -> Result<DeckArtifact> {
        let artifact = DeckArtifact {
            deck_name: spec.name.clone(),
            deck_id,
            file_path: fs::canonicalize(output_path)?,
            template_name: spec.template.template_name.clone(),
            template_id: spec.template.template_id,
        };
        self.store.save(&artifact)?;
        Ok(artifact)
    }

    /// Confirm a reviewed deck. Alias of [`DeckPackager::package`].
    pub fn confirm(&self, spec: &DeckSpec) -> Result<DeckArtifact> {
        self.package(spec)
    }

    pub fn list(&self) -> Result<Vec<DeckArtifact>> {
        Ok(self.store.list()?)
    }

    /// Remove a deck's package and metadata. False if either is missing or fails.
    pub fn delete(&self, deck_id: i64) -> bool {
        self.store.delete(deck_id)
    }
}
