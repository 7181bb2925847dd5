//! Relational catalog access.
//!
//! The engine touches four things in the store: the application list with
//! each application's content asset, per-channel title ID columns, the
//! application version counter, and the ticket table. [`CatalogStore`]
//! covers exactly those; [`postgres::PgCatalog`] is the production backend
//! and `memory::MemoryCatalog` an in-process one for tests.

#[cfg(any(test, feature = "test-seams"))]
pub mod memory;
pub mod models;
pub mod postgres;

use crate::identity::channel::Channel;
use crate::identity::TitleId;
use crate::TitlegenError;
use async_trait::async_trait;
use models::{Application, ApplicationId, TicketRow};

/// Store operations used by the lifecycle engine.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch one application with an associated content asset.
    ///
    /// Returns `NotFound` if the application does not exist or has no asset.
    async fn application(&self, id: ApplicationId) -> Result<Application, TitlegenError>;

    /// Every application with an associated content asset, ordered by ID.
    async fn applications(&self) -> Result<Vec<Application>, TitlegenError>;

    /// The stored title ID for a channel, as written in the catalog.
    ///
    /// `None` when no mapping row or no value for this channel exists.
    async fn channel_title(
        &self,
        id: ApplicationId,
        channel: Channel,
    ) -> Result<Option<String>, TitlegenError>;

    /// Atomically increment the application's version and return the new value.
    async fn bump_version(&self, id: ApplicationId) -> Result<i32, TitlegenError>;

    /// Insert or overwrite the ticket for a title.
    async fn upsert_ticket(
        &self,
        title_id: TitleId,
        ticket: &[u8],
        version: i32,
    ) -> Result<(), TitlegenError>;

    /// Read back the stored ticket for a title.
    async fn ticket(&self, title_id: TitleId) -> Result<Option<TicketRow>, TitlegenError>;
}
