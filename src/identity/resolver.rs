//! Title identity resolution.
//!
//! Each channel binds exactly one strategy:
//! - SD titles are derived from the application ordinal (no store access).
//! - NAND and forwarder titles are looked up from the catalog's `title_ids` row.

use crate::catalog::models::ApplicationId;
use crate::catalog::CatalogStore;
use crate::identity::channel::Channel;
use crate::identity::code::{pack_code, OrdinalEncoding, SD_NAMESPACE};
use crate::identity::TitleId;
use crate::TitlegenError;

/// How a channel obtains its title identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `namespace | code(ordinal)`.
    Derive {
        /// High bits shared by every title of the channel.
        namespace: u64,
    },
    /// Read the persisted per-channel column.
    Lookup,
}

/// The strategy bound to a channel.
pub fn strategy_for(channel: Channel) -> Strategy {
    match channel {
        Channel::Sd => Strategy::Derive {
            namespace: SD_NAMESPACE,
        },
        Channel::Nand | Channel::Forwarder => Strategy::Lookup,
    }
}

/// Derive a title ID from an application ordinal.
pub fn derive_title(
    namespace: u64,
    encoding: OrdinalEncoding,
    application: ApplicationId,
) -> Result<TitleId, TitlegenError> {
    let code = u32::try_from(application)
        .ok()
        .and_then(|ordinal| encoding.encode(ordinal))
        .ok_or_else(|| {
            TitlegenError::NotFound(format!(
                "no title code for application {} under {:?} encoding",
                application, encoding
            ))
        })?;
    Ok(TitleId::new(namespace | pack_code(code)))
}

/// Resolves title identities for applications.
pub struct TitleResolver<'a> {
    catalog: &'a dyn CatalogStore,
    encoding: OrdinalEncoding,
}

impl<'a> TitleResolver<'a> {
    /// Create a resolver over the given catalog.
    pub fn new(catalog: &'a dyn CatalogStore, encoding: OrdinalEncoding) -> Self {
        Self { catalog, encoding }
    }

    /// Resolve the title identity for an application under a channel.
    ///
    /// # Errors
    /// - `NotFound` - no derivable code, or no stored mapping for the channel
    /// - `StoreUnavailable` - lookup query failed
    pub async fn resolve(
        &self,
        channel: Channel,
        application: ApplicationId,
    ) -> Result<TitleId, TitlegenError> {
        let title_id = match strategy_for(channel) {
            Strategy::Derive { namespace } => derive_title(namespace, self.encoding, application)?,
            Strategy::Lookup => {
                let raw = self
                    .catalog
                    .channel_title(application, channel)
                    .await?
                    .ok_or_else(|| {
                        TitlegenError::NotFound(format!(
                            "no {} title for application {}",
                            channel, application
                        ))
                    })?;
                TitleId::from_hex(&raw)?
            }
        };

        tracing::debug!(%channel, application_id = application, title_id = %title_id, "resolved title");
        Ok(title_id)
    }
}
