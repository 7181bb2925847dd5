//! Import of externally produced packages.
//!
//! Identity and version come from the package itself; the resolver and the
//! version ledger are never consulted.

use crate::codec::wad::Wad;
use crate::identity::TitleId;
use crate::ledger::TitleVersion;
use crate::storage::writer::TitleWriter;
use crate::TitlegenError;

/// What an import stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Title the package was stored under.
    pub title_id: TitleId,
    /// Version recorded with the ticket.
    pub version: TitleVersion,
    /// Number of content artifacts written.
    pub contents: usize,
}

/// Feeds parsed packages through the storage writer.
pub struct Importer<'a> {
    writer: TitleWriter<'a>,
}

impl<'a> Importer<'a> {
    /// Create an importer writing through `writer`.
    pub fn new(writer: TitleWriter<'a>) -> Self {
        Self { writer }
    }

    /// Parse and store a raw package.
    ///
    /// The stored ticket has its ticket ID zeroed; every other byte is kept.
    ///
    /// # Errors
    /// - `MalformedPackage` - the bytes are not a valid package
    /// - `IoFailure` / `StoreUnavailable` - persisting failed
    pub async fn import(&self, raw: &[u8]) -> Result<ImportSummary, TitlegenError> {
        let mut wad = Wad::parse(raw).map_err(|e| match e {
            TitlegenError::CodecError(msg) => TitlegenError::MalformedPackage(msg),
            other => other,
        })?;

        let title_id = TitleId::new(wad.tmd.title_id);
        wad.ticket.ticket_id = 0;
        self.writer.persist(title_id, &wad).await?;

        let summary = ImportSummary {
            title_id,
            version: wad.ticket.title_version,
            contents: wad.contents.len(),
        };
        tracing::info!(
            title_id = %summary.title_id,
            version = summary.version,
            contents = summary.contents,
            "imported package"
        );
        Ok(summary)
    }
}
