//! PostgreSQL catalog backend.

use crate::catalog::models::{Application, ApplicationId, TicketRow};
use crate::catalog::CatalogStore;
use crate::identity::channel::Channel;
use crate::identity::TitleId;
use crate::TitlegenError;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

/// Map a driver error into the store taxonomy, keeping the failed operation.
fn store_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> TitlegenError {
    move |e| TitlegenError::StoreUnavailable(format!("{}: {}", operation, e))
}

/// Column of `title_ids` holding a channel's title.
fn title_column(channel: Channel) -> &'static str {
    match channel {
        Channel::Sd => "sd_title",
        Channel::Nand => "nand_title",
        Channel::Forwarder => "forwarder_title",
    }
}

fn parse_asset(id: ApplicationId, raw: &str) -> Result<Application, TitlegenError> {
    let asset = Uuid::parse_str(raw.trim()).map_err(|e| {
        TitlegenError::StoreUnavailable(format!(
            "application {} has malformed asset UUID '{}': {}",
            id, raw, e
        ))
    })?;
    Ok(Application { id, asset })
}

/// Catalog backed by a PostgreSQL connection pool.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Connect to PostgreSQL.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, TitlegenError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(store_error("connect"))?;

        tracing::debug!(max_connections, "connected to catalog");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn application(&self, id: ApplicationId) -> Result<Application, TitlegenError> {
        let row: Option<(ApplicationId, String)> = sqlx::query_as(
            "SELECT application.id, metadata.file_uuid::text
             FROM application
             JOIN metadata ON metadata.application_id = application.id
             WHERE application.id = $1 AND metadata.file_uuid IS NOT NULL
             ORDER BY metadata.file_uuid
             LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("fetch application"))?;

        let (id, raw) = row.ok_or_else(|| {
            TitlegenError::NotFound(format!("application {} with a content asset", id))
        })?;
        parse_asset(id, &raw)
    }

    async fn applications(&self) -> Result<Vec<Application>, TitlegenError> {
        // One row per application even with several metadata rows.
        let rows: Vec<(ApplicationId, String)> = sqlx::query_as(
            "SELECT DISTINCT ON (application.id) application.id, metadata.file_uuid::text
             FROM application
             JOIN metadata ON metadata.application_id = application.id
             WHERE metadata.file_uuid IS NOT NULL
             ORDER BY application.id, metadata.file_uuid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("list applications"))?;

        rows.iter().map(|(id, raw)| parse_asset(*id, raw)).collect()
    }

    async fn channel_title(
        &self,
        id: ApplicationId,
        channel: Channel,
    ) -> Result<Option<String>, TitlegenError> {
        // Column names come from a closed match, never from input.
        let query = format!(
            "SELECT {} FROM title_ids WHERE application_id = $1",
            title_column(channel)
        );
        let row: Option<(Option<String>,)> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error("fetch channel title"))?;

        Ok(row.and_then(|(value,)| value))
    }

    async fn bump_version(&self, id: ApplicationId) -> Result<i32, TitlegenError> {
        let version: Option<i32> = sqlx::query_scalar(
            "UPDATE application
             SET version = version + 1
             WHERE id = $1
             RETURNING version",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("bump version"))?;

        version.ok_or_else(|| TitlegenError::NotFound(format!("application {}", id)))
    }

    async fn upsert_ticket(
        &self,
        title_id: TitleId,
        ticket: &[u8],
        version: i32,
    ) -> Result<(), TitlegenError> {
        sqlx::query(
            "INSERT INTO tickets (title_id, ticket, version) VALUES ($1, $2, $3)
             ON CONFLICT (title_id)
             DO UPDATE SET ticket = EXCLUDED.ticket, version = EXCLUDED.version",
        )
        .bind(title_id.to_string())
        .bind(ticket)
        .bind(version)
        .execute(&self.pool)
        .await
        .map_err(store_error("upsert ticket"))?;

        Ok(())
    }

    async fn ticket(&self, title_id: TitleId) -> Result<Option<TicketRow>, TitlegenError> {
        let row: Option<(Vec<u8>, i32)> =
            sqlx::query_as("SELECT ticket, version FROM tickets WHERE title_id = $1")
                .bind(title_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error("fetch ticket"))?;

        Ok(row.map(|(ticket, version)| TicketRow {
            title_id,
            ticket,
            version,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_columns_are_distinct() {
        let columns: std::collections::HashSet<_> =
            Channel::ALL.into_iter().map(title_column).collect();
        assert_eq!(columns.len(), Channel::ALL.len());
    }

    #[test]
    fn test_parse_asset_accepts_uuid() {
        let app = parse_asset(7, "a1b2c3d4-0000-4000-8000-000000000007").unwrap();
        assert_eq!(app.id, 7);
        assert_eq!(
            app.asset.to_string(),
            "a1b2c3d4-0000-4000-8000-000000000007"
        );
    }

    #[test]
    fn test_parse_asset_rejects_garbage() {
        assert!(matches!(
            parse_asset(7, "not-a-uuid"),
            Err(TitlegenError::StoreUnavailable(_))
        ));
    }
}
