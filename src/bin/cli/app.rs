use anyhow::{bail, Context, Result};

use cardsmith::flashcards::{generate_id, DeckStore, GenerationParameters, TemplateSpec, TemplateStore};
use cardsmith::llm::HttpModelClient;
use cardsmith::sync::{SyncError, SyncManager, WebDavStore};
use cardsmith::{Config, DeckPackager, FlashcardGenerator, Workspace};

use crate::{PromptArgs, TemplateArgs};

/// Shared application state for CLI commands
pub struct App {
    pub config: Config,
    pub workspace: Workspace,
}

impl App {
    /// Initialize from config file and environment
    pub fn new() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        let workspace = config.workspace();

        Ok(Self { config, workspace })
    }

    pub fn generator(&self) -> Result<FlashcardGenerator<HttpModelClient>> {
        let client = self
            .config
            .model_client()
            .context("Failed to create model client")?;
        Ok(FlashcardGenerator::new(client, self.config.chunk_config()))
    }

    pub fn decks(&self) -> DeckStore {
        self.workspace.deck_store()
    }

    pub fn templates(&self) -> TemplateStore {
        self.workspace.template_store()
    }

    pub fn packager(&self) -> DeckPackager {
        DeckPackager::new(self.decks())
    }

    pub fn sync_manager(&self) -> Result<SyncManager<WebDavStore>> {
        let sync = self.config.sync.as_ref().ok_or(SyncError::NotConfigured)?;
        let remote = WebDavStore::new(&sync.url, sync.username.clone(), sync.password.clone())
            .context("Failed to create WebDAV client")?;
        Ok(SyncManager::new(remote, self.decks(), self.templates()))
    }

    /// Resolve a stored template or build an inline one
    pub fn resolve_template(&self, args: &TemplateArgs) -> Result<TemplateSpec> {
        let spec = if let Some(id) = args.template {
            self.templates()
                .get(id)
                .context(format!("Template {} not found", id))?
                .spec
        } else {
            if args.front.is_empty() || args.back.is_empty() {
                bail!("Pass --template <id>, or both --front and --back");
            }
            TemplateSpec::new(
                generate_id(),
                args.template_name.clone(),
                args.front.clone(),
                args.back.clone(),
            )
        };

        spec.validate().context("Invalid template")?;
        Ok(spec)
    }
}

impl PromptArgs {
    pub fn parameters(&self) -> GenerationParameters {
        GenerationParameters::new(self.system_prompt.clone(), self.temperature, self.max_tokens)
    }
}
