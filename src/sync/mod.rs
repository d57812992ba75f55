//! Sharing decks and templates through a remote store.
//!
//! Remote layout mirrors the local data directory:
//! ```text
//! {remote}/
//! ├── decks/{deck_name}_{deck-id}.apkg
//! ├── deck_meta/{deck-id}.json
//! └── templates/{template-id}.json
//! ```

mod manager;
mod webdav;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::StoreError;

pub use manager::{SyncManager, SyncReport};
pub use webdav::{ResourceInfo, WebDavError, WebDavStore};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("WebDAV error: {0}")]
    WebDav(#[from] WebDavError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Sync is not configured")]
    NotConfigured,
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// A directory of files kept in step between local and remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Decks,
    DeckMeta,
    Templates,
}

impl Collection {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Collection::Decks => "decks",
            Collection::DeckMeta => "deck_meta",
            Collection::Templates => "templates",
        }
    }
}

/// Remote side of a sync: flat collections of named files
pub trait RemoteStore {
    /// File names in a collection; a missing collection is empty
    fn list(&self, collection: Collection) -> Result<Vec<String>>;

    fn upload(&self, collection: Collection, name: &str, data: &[u8]) -> Result<()>;

    fn download(&self, collection: Collection, name: &str) -> Result<Vec<u8>>;
}
