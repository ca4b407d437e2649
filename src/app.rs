//! Composition root
//!
//! Builds the store, the fetch client and the repository once, and hands out
//! references to them.

use crate::api::{NoteSession, OfflineFirstRepository, ReaderSession, VersionListModel};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Result;
use crate::remote::{BibleApi, HttpBibleApi};
use crate::storage::{LocalStore, NoteKey};
use std::sync::Arc;

pub struct AppContainer {
    config: Config,
    repository: OfflineFirstRepository,
    version_list: VersionListModel,
}

impl AppContainer {
    /// Open the on-disk store and the HTTP client described by `config`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let store = LocalStore::open(&config)?;
        let api = HttpBibleApi::new(&config.network)?;
        log::info!("Opened store at {}", config.database.path.display());
        Ok(Self::with_parts(config, store, Arc::new(api)))
    }

    /// Assemble from an existing store and fetch client
    pub fn with_parts(config: Config, store: LocalStore, api: Arc<dyn BibleApi>) -> Self {
        let repository = OfflineFirstRepository::new(api, store, Catalog::default());
        let version_list = VersionListModel::new(repository.clone());
        Self {
            config,
            repository,
            version_list,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &OfflineFirstRepository {
        &self.repository
    }

    pub fn version_list(&self) -> &VersionListModel {
        &self.version_list
    }

    /// Start a reading session over a downloaded version
    pub fn reader(&self, version_id: &str) -> ReaderSession {
        ReaderSession::start(self.repository.clone(), version_id)
    }

    /// Start an editing session for the note at `key`
    pub fn note(&self, key: NoteKey) -> NoteSession {
        NoteSession::start(self.repository.clone(), key)
    }
}
