use std::collections::HashSet;
use std::fs;

use serde::Serialize;

use crate::flashcards::{DeckArtifact, DeckStore, StoredTemplate, TemplateStore};

use super::{Collection, RemoteStore, Result};

/// What one sync pass moved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub decks_uploaded: usize,
    pub templates_uploaded: usize,
    pub decks_downloaded: usize,
    pub templates_downloaded: usize,
    /// Items skipped because of an error
    pub failed: usize,
}

fn record_name(id: i64) -> String {
    format!("{}.json", id)
}

fn parse_record_name(name: &str) -> Option<i64> {
    name.strip_suffix(".json")?.parse().ok()
}

/// Copies decks and templates missing on one side to the other.
///
/// Items are matched by file name only; nothing is ever overwritten or deleted.
pub struct SyncManager<R> {
    remote: R,
    decks: DeckStore,
    templates: TemplateStore,
}

impl<R: RemoteStore> SyncManager<R> {
    pub fn new(remote: R, decks: DeckStore, templates: TemplateStore) -> Self {
        Self {
            remote,
            decks,
            templates,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    fn remote_names(&self, collection: Collection) -> Result<HashSet<String>> {
        Ok(self.remote.list(collection)?.into_iter().collect())
    }

    /// Push local decks, deck metadata and templates absent remotely
    pub fn upload(&self) -> Result<SyncReport> {
        let remote_decks = self.remote_names(Collection::Decks)?;
        let remote_meta = self.remote_names(Collection::DeckMeta)?;
        let remote_templates = self.remote_names(Collection::Templates)?;

        let mut report = SyncReport::default();

        for artifact in self.decks.list()? {
            match self.upload_deck(&artifact, &remote_decks, &remote_meta) {
                Ok(true) => report.decks_uploaded += 1,
                Ok(false) => {}
                Err(e) => {
                    log::warn!("Failed to upload deck {}: {}", artifact.deck_id, e);
                    report.failed += 1;
                }
            }
        }

        for template in self.templates.list()? {
            let name = record_name(template.id());
            if remote_templates.contains(&name) {
                continue;
            }

            let result = serde_json::to_vec_pretty(&template)
                .map_err(Into::into)
                .and_then(|data| self.remote.upload(Collection::Templates, &name, &data));
            match result {
                Ok(()) => report.templates_uploaded += 1,
                Err(e) => {
                    log::warn!("Failed to upload template {}: {}", template.id(), e);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Sync upload: {} decks, {} templates, {} failed",
            report.decks_uploaded,
            report.templates_uploaded,
            report.failed
        );
        Ok(report)
    }

    /// Upload a deck's package and metadata. Returns whether anything was sent.
    fn upload_deck(
        &self,
        artifact: &DeckArtifact,
        remote_decks: &HashSet<String>,
        remote_meta: &HashSet<String>,
    ) -> Result<bool> {
        let mut sent = false;

        if let Some(file_name) = artifact.file_name() {
            if !remote_decks.contains(&file_name) {
                let data = fs::read(&artifact.file_path)?;
                self.remote.upload(Collection::Decks, &file_name, &data)?;
                sent = true;
            }
        }

        let meta_name = record_name(artifact.deck_id);
        if !remote_meta.contains(&meta_name) {
            let data = serde_json::to_vec_pretty(artifact)?;
            self.remote.upload(Collection::DeckMeta, &meta_name, &data)?;
            sent = true;
        }

        Ok(sent)
    }

    /// Pull decks and templates whose identifiers are unknown locally
    pub fn download(&self) -> Result<SyncReport> {
        let remote_meta = self.remote.list(Collection::DeckMeta)?;
        let remote_templates = self.remote.list(Collection::Templates)?;
        let local_decks: HashSet<i64> = self.decks.metadata().ids()?.into_iter().collect();
        let local_templates: HashSet<i64> = self.templates.ids()?.into_iter().collect();

        let mut report = SyncReport::default();

        for name in remote_meta {
            let Some(deck_id) = parse_record_name(&name) else {
                continue;
            };
            if local_decks.contains(&deck_id) {
                continue;
            }

            match self.download_deck(&name) {
                Ok(()) => report.decks_downloaded += 1,
                Err(e) => {
                    log::warn!("Failed to download deck {}: {}", deck_id, e);
                    report.failed += 1;
                }
            }
        }

        for name in remote_templates {
            let Some(template_id) = parse_record_name(&name) else {
                continue;
            };
            if local_templates.contains(&template_id) {
                continue;
            }

            let result = self
                .remote
                .download(Collection::Templates, &name)
                .and_then(|data| Ok(serde_json::from_slice::<StoredTemplate>(&data)?))
                .and_then(|template| Ok(self.templates.save(&template)?));
            match result {
                Ok(()) => report.templates_downloaded += 1,
                Err(e) => {
                    log::warn!("Failed to download template {}: {}", template_id, e);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Sync download: {} decks, {} templates, {} failed",
            report.decks_downloaded,
            report.templates_downloaded,
            report.failed
        );
        Ok(report)
    }

    /// Fetch a deck's metadata and package, then record it locally
    fn download_deck(&self, meta_name: &str) -> Result<()> {
        let data = self.remote.download(Collection::DeckMeta, meta_name)?;
        let mut artifact: DeckArtifact = serde_json::from_slice(&data)?;

        if let Some(file_name) = artifact.file_name() {
            let package = self.remote.download(Collection::Decks, &file_name)?;
            fs::create_dir_all(self.decks.decks_dir())?;
            let local_path = self.decks.decks_dir().join(&file_name);
            fs::write(&local_path, package)?;
            artifact.file_path = fs::canonicalize(&local_path)?;
        }

        self.decks.save(&artifact)?;
        Ok(())
    }
}
