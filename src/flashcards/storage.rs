//! On-disk stores for deck metadata and templates
//!
//! Directory structure under the data directory:
//! ```text
//! {data_dir}/
//! ├── decks/
//! │   └── {deck_name}_{deck-id}.apkg   # Packaged decks
//! ├── deck_meta/
//! │   └── {deck-id}.json               # DeckArtifact records
//! └── templates/
//!     └── {template-id}.json           # StoredTemplate records
//! ```

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::models::*;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid template: {0}")]
    InvalidTemplate(#[from] TemplateError),

    #[error("Not found: {0}")]
    NotFound(i64),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A directory of `{id}.json` documents of one type
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    dir: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            _marker: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for an identifier
    pub fn path_for(&self, id: i64) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Write a document, replacing any previous one with the same id
    pub fn save(&self, id: i64, item: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(id), serde_json::to_string_pretty(item)?)?;
        Ok(())
    }

    pub fn load(&self, id: i64) -> Result<T> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id));
        }

        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.path_for(id).exists()
    }

    /// Read every document in the directory, skipping files that do not parse
    pub fn list(&self) -> Result<Vec<T>> {
        fs::create_dir_all(&self.dir)?;

        let mut items = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let parsed = fs::read_to_string(&path)
                    .map_err(StoreError::from)
                    .and_then(|content| Ok(serde_json::from_str::<T>(&content)?));
                match parsed {
                    Ok(item) => items.push(item),
                    Err(e) => log::warn!("Skipping unreadable record {:?}: {}", path, e),
                }
            }
        }

        Ok(items)
    }

    /// Identifiers of every `{id}.json` file, parsed from the file names
    pub fn ids(&self) -> Result<Vec<i64>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(id) = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| stem.parse().ok())
                {
                    ids.push(id);
                }
            }
        }

        Ok(ids)
    }

    /// Remove a document. Returns false when it did not exist.
    pub fn remove(&self, id: i64) -> Result<bool> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }
}

/// Packaged deck files plus their metadata records
#[derive(Debug, Clone)]
pub struct DeckStore {
    decks_dir: PathBuf,
    metadata: JsonStore<DeckArtifact>,
}

impl DeckStore {
    pub fn new(decks_dir: PathBuf, metadata_dir: PathBuf) -> Self {
        Self {
            decks_dir,
            metadata: JsonStore::new(metadata_dir),
        }
    }

    /// Directory holding the `.apkg` files
    pub fn decks_dir(&self) -> &Path {
        &self.decks_dir
    }

    pub fn metadata(&self) -> &JsonStore<DeckArtifact> {
        &self.metadata
    }

    pub fn save(&self, artifact: &DeckArtifact) -> Result<()> {
        self.metadata.save(artifact.deck_id, artifact)
    }

    pub fn get(&self, deck_id: i64) -> Result<DeckArtifact> {
        self.metadata.load(deck_id)
    }

    pub fn list(&self) -> Result<Vec<DeckArtifact>> {
        self.metadata.list()
    }

    /// Delete a deck's package file and its metadata record.
    ///
    /// Returns false if the record does not exist or any removal fails.
    pub fn delete(&self, deck_id: i64) -> bool {
        if !self.metadata.contains(deck_id) {
            return false;
        }

        let result = self.metadata.load(deck_id).and_then(|artifact| {
            if artifact.file_path.exists() {
                fs::remove_file(&artifact.file_path)?;
            }
            self.metadata.remove(deck_id)
        });

        match result {
            Ok(removed) => removed,
            Err(e) => {
                log::warn!("Failed to delete deck {}: {}", deck_id, e);
                false
            }
        }
    }
}

/// Templates persisted independently of decks
#[derive(Debug, Clone)]
pub struct TemplateStore {
    store: JsonStore<StoredTemplate>,
}

impl TemplateStore {
    pub fn new(templates_dir: PathBuf) -> Self {
        Self {
            store: JsonStore::new(templates_dir),
        }
    }

    pub fn dir(&self) -> &Path {
        self.store.dir()
    }

    /// Validate and persist a new template under a fresh identifier
    pub fn create(&self, name: String, front: Vec<String>, back: Vec<String>) -> Result<StoredTemplate> {
        let spec = TemplateSpec::new(generate_id(), name, front, back);
        spec.validate()?;

        let template = StoredTemplate { spec };
        self.store.save(template.id(), &template)?;
        Ok(template)
    }

    /// Persist a template as-is, keeping its identifier
    pub fn save(&self, template: &StoredTemplate) -> Result<()> {
        self.store.save(template.id(), template)
    }

    pub fn get(&self, template_id: i64) -> Result<StoredTemplate> {
        self.store.load(template_id)
    }

    pub fn list(&self) -> Result<Vec<StoredTemplate>> {
        self.store.list()
    }

    pub fn ids(&self) -> Result<Vec<i64>> {
        self.store.ids()
    }

    pub fn delete(&self, template_id: i64) -> Result<bool> {
        self.store.remove(template_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn deck_store(dir: &TempDir) -> DeckStore {
        DeckStore::new(dir.path().join("decks"), dir.path().join("deck_meta"))
    }

    fn artifact(store: &DeckStore, deck_id: i64) -> DeckArtifact {
        DeckArtifact {
            deck_name: "Biology".to_string(),
            deck_id,
            file_path: store.decks_dir().join(format!("Biology_{}.apkg", deck_id)),
            template_name: "Basic".to_string(),
            template_id: 7,
        }
    }

    #[test]
    fn test_save_list_delete_deck() {
        let dir = TempDir::new().unwrap();
        let store = deck_store(&dir);

        let artifact = artifact(&store, 42);
        fs::create_dir_all(store.decks_dir()).unwrap();
        fs::write(&artifact.file_path, b"pkg").unwrap();
        store.save(&artifact).unwrap();

        assert_eq!(store.list().unwrap(), vec![artifact.clone()]);
        assert_eq!(store.get(42).unwrap(), artifact);

        assert!(store.delete(42));
        assert!(!artifact.file_path.exists());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_deck_returns_false() {
        let dir = TempDir::new().unwrap();
        let store = deck_store(&dir);
        assert!(!store.delete(12345));
    }

    #[test]
    fn test_delete_with_missing_package_file() {
        let dir = TempDir::new().unwrap();
        let store = deck_store(&dir);
        store.save(&artifact(&store, 9)).unwrap();

        assert!(store.delete(9));
        assert!(!store.metadata().contains(9));
    }

    #[test]
    fn test_list_skips_unparsable_files() {
        let dir = TempDir::new().unwrap();
        let store = deck_store(&dir);
        store.save(&artifact(&store, 1)).unwrap();

        fs::write(store.metadata().dir().join("2.json"), "{not json").unwrap();
        fs::write(store.metadata().dir().join("3.json"), r#"{"deck_name": "x"}"#).unwrap();
        fs::write(store.metadata().dir().join("notes.txt"), "ignored").unwrap();

        let decks = store.list().unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].deck_id, 1);
    }

    #[test]
    fn test_list_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = deck_store(&dir);
        assert!(store.list().unwrap().is_empty());
        assert!(store.metadata().dir().exists());
    }

    #[test]
    fn test_template_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = TemplateStore::new(dir.path().join("templates"));

        let created = store
            .create(
                "Vocabulary".to_string(),
                vec!["Word".to_string()],
                vec!["Meaning".to_string(), "Example".to_string()],
            )
            .unwrap();

        assert!(dir
            .path()
            .join("templates")
            .join(format!("{}.json", created.id()))
            .exists());
        assert_eq!(store.get(created.id()).unwrap(), created);
        assert_eq!(store.list().unwrap(), vec![created.clone()]);
        assert_eq!(store.ids().unwrap(), vec![created.id()]);

        assert!(store.delete(created.id()).unwrap());
        assert!(!store.delete(created.id()).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_template_create_rejects_invalid_spec() {
        let dir = TempDir::new().unwrap();
        let store = TemplateStore::new(dir.path().join("templates"));

        let err = store
            .create("Broken".to_string(), vec!["Same".to_string()], vec!["Same".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTemplate(TemplateError::DuplicateField(_))
        ));
        assert!(store.list().unwrap().is_empty());
    }
}
