//! In-process catalog backend for tests.
//!
//! Holds the same state as the relational schema behind one mutex, so every
//! operation, including version increments, is atomic with respect to
//! concurrent callers.

use crate::catalog::models::{Application, ApplicationId, TicketRow};
use crate::catalog::CatalogStore;
use crate::identity::channel::Channel;
use crate::identity::TitleId;
use crate::TitlegenError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryApplication {
    asset: Option<Uuid>,
    version: i32,
    titles: HashMap<Channel, String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    applications: BTreeMap<ApplicationId, MemoryApplication>,
    tickets: HashMap<TitleId, TicketRow>,
}

/// Catalog kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<MemoryState>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // State stays consistent across a panicking holder; every mutation is a single step.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add or replace an application.
    pub fn insert_application(&self, id: ApplicationId, asset: Option<Uuid>, version: i32) {
        let mut state = self.state();
        let app = state.applications.entry(id).or_default();
        app.asset = asset;
        app.version = version;
    }

    /// Store a per-channel title value for an application.
    pub fn set_channel_title(&self, id: ApplicationId, channel: Channel, value: &str) {
        self.state()
            .applications
            .entry(id)
            .or_default()
            .titles
            .insert(channel, value.to_string());
    }

    /// Current version counter of an application.
    pub fn version(&self, id: ApplicationId) -> Option<i32> {
        self.state().applications.get(&id).map(|app| app.version)
    }

    /// Number of stored tickets.
    pub fn ticket_count(&self) -> usize {
        self.state().tickets.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn application(&self, id: ApplicationId) -> Result<Application, TitlegenError> {
        self.state()
            .applications
            .get(&id)
            .and_then(|app| app.asset)
            .map(|asset| Application { id, asset })
            .ok_or_else(|| {
                TitlegenError::NotFound(format!("application {} with a content asset", id))
            })
    }

    async fn applications(&self) -> Result<Vec<Application>, TitlegenError> {
        Ok(self
            .state()
            .applications
            .iter()
            .filter_map(|(id, app)| app.asset.map(|asset| Application { id: *id, asset }))
            .collect())
    }

    async fn channel_title(
        &self,
        id: ApplicationId,
        channel: Channel,
    ) -> Result<Option<String>, TitlegenError> {
        Ok(self
            .state()
            .applications
            .get(&id)
            .and_then(|app| app.titles.get(&channel).cloned()))
    }

    async fn bump_version(&self, id: ApplicationId) -> Result<i32, TitlegenError> {
        let mut state = self.state();
        let app = state
            .applications
            .get_mut(&id)
            .ok_or_else(|| TitlegenError::NotFound(format!("application {}", id)))?;
        app.version += 1;
        Ok(app.version)
    }

    async fn upsert_ticket(
        &self,
        title_id: TitleId,
        ticket: &[u8],
        version: i32,
    ) -> Result<(), TitlegenError> {
        self.state().tickets.insert(
            title_id,
            TicketRow {
                title_id,
                ticket: ticket.to_vec(),
                version,
            },
        );
        Ok(())
    }

    async fn ticket(&self, title_id: TitleId) -> Result<Option<TicketRow>, TitlegenError> {
        Ok(self.state().tickets.get(&title_id).cloned())
    }
}
