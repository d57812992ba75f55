//! Configuration and the on-disk workspace layout.
//!
//! Settings come from `{data_dir}/config.toml` when present, then from the
//! environment:
//!
//! - `CARDSMITH_DATA_DIR` - data directory (default: platform data dir + `cardsmith`)
//! - `MODEL_HOST`, `MODEL_NAME`, `MODEL_TIMEOUT_SECS` - model backend
//! - `CARDSMITH_SYNC_URL`, `CARDSMITH_SYNC_USER`, `CARDSMITH_SYNC_PASSWORD` - WebDAV sync

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::{DeckStore, TemplateStore};
use crate::llm::{HttpModelClient, ModelBackendError};
use crate::segmenter::{ChunkConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Model backend: {0}")]
    ModelBackend(#[from] ModelBackendError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// WebDAV sync settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub model_host: String,
    pub model_name: String,
    /// No timeout when unset
    pub request_timeout_secs: Option<u64>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub sync: Option<SyncConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            model_host: "http://localhost:1234".to_string(),
            model_name: String::new(),
            request_timeout_secs: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            sync: None,
        }
    }
}

impl Config {
    /// Platform default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("cardsmith"))
            .ok_or(ConfigError::DataDirNotFound)
    }

    /// Load from the config file and process environment
    pub fn load() -> Result<Self> {
        let data_dir = match env::var("CARDSMITH_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => Self::default_data_dir()?,
        };
        Self::load_from(data_dir, |key| env::var(key).ok())
    }

    /// Load `{data_dir}/config.toml`, then apply overrides from `lookup`
    pub fn load_from(data_dir: PathBuf, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.data_dir = data_dir;
        config.apply_overrides(lookup)?;

        log::debug!("Loaded config from {}", config.data_dir.display());
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("MODEL_HOST") {
            self.model_host = host;
        }
        if let Some(name) = lookup("MODEL_NAME") {
            self.model_name = name;
        }
        if let Some(secs) = lookup("MODEL_TIMEOUT_SECS") {
            let parsed = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "MODEL_TIMEOUT_SECS".to_string(),
                value: secs.clone(),
            })?;
            self.request_timeout_secs = Some(parsed);
        }

        if let Some(url) = lookup("CARDSMITH_SYNC_URL") {
            let sync = self.sync.get_or_insert_with(|| SyncConfig {
                url: String::new(),
                username: String::new(),
                password: None,
            });
            sync.url = url;
        }
        if let Some(sync) = self.sync.as_mut() {
            if let Some(user) = lookup("CARDSMITH_SYNC_USER") {
                sync.username = user;
            }
            if let Some(password) = lookup("CARDSMITH_SYNC_PASSWORD") {
                sync.password = Some(password);
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            chunk_size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }

    pub fn model_client(&self) -> Result<HttpModelClient> {
        Ok(HttpModelClient::new(
            &self.model_host,
            self.model_name.clone(),
            self.request_timeout(),
        )?)
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.data_dir.clone())
    }

    /// Write the current settings to `{data_dir}/config.toml`
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: CONFIG_FILE_NAME.to_string(),
            value: e.to_string(),
        })?;
        fs::write(self.data_dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }
}

/// Storage handle rooted at the data directory
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn decks_dir(&self) -> PathBuf {
        self.root.join("decks")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join("deck_meta")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn deck_store(&self) -> DeckStore {
        DeckStore::new(self.decks_dir(), self.metadata_dir())
    }

    pub fn template_store(&self) -> TemplateStore {
        TemplateStore::new(self.templates_dir())
    }
}
