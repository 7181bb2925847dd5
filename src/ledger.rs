//! Version ledger: the catalog's per-application version counter.

use crate::catalog::models::ApplicationId;
use crate::catalog::CatalogStore;
use crate::TitlegenError;

/// A title version as carried by the TMD and ticket.
pub type TitleVersion = u16;

/// Hands out monotonically increasing versions.
///
/// Increments are never rolled back; a failure after `next_version` leaves
/// a gap in the sequence.
pub struct VersionLedger<'a> {
    catalog: &'a dyn CatalogStore,
}

impl<'a> VersionLedger<'a> {
    /// Create a ledger over the given catalog.
    pub fn new(catalog: &'a dyn CatalogStore) -> Self {
        Self { catalog }
    }

    /// Atomically bump and return the application's version.
    ///
    /// # Errors
    /// - `NotFound` - application does not exist
    /// - `VersionOutOfRange` - counter no longer fits a title version
    /// - `StoreUnavailable` - update failed
    pub async fn next_version(
        &self,
        application: ApplicationId,
    ) -> Result<TitleVersion, TitlegenError> {
        let stored = self.catalog.bump_version(application).await?;
        let version = TitleVersion::try_from(stored)
            .map_err(|_| TitlegenError::VersionOutOfRange(i64::from(stored)))?;

        tracing::debug!(application_id = application, version, "bumped version");
        Ok(version)
    }
}
