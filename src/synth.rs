//! Package synthesis from templates.

use crate::codec::cipher::AesKey;
use crate::codec::wad::Wad;
use crate::identity::TitleId;
use crate::keysource::KeySource;
use crate::ledger::TitleVersion;
use crate::templates::TemplateStore;
use crate::TitlegenError;

/// Builds complete packages from the template store and a content blob.
pub struct Synthesizer<'a> {
    templates: &'a TemplateStore,
    keys: &'a dyn KeySource,
    common_key: &'a AesKey,
}

impl<'a> Synthesizer<'a> {
    /// Create a synthesizer.
    pub fn new(
        templates: &'a TemplateStore,
        keys: &'a dyn KeySource,
        common_key: &'a AesKey,
    ) -> Self {
        Self {
            templates,
            keys,
            common_key,
        }
    }

    /// Build a single-content package for `title_id` at `version`.
    ///
    /// The package carries a fresh title key and a zeroed ticket ID. Nothing
    /// is returned unless every step succeeds.
    ///
    /// # Errors
    /// - `RandomnessUnavailable` - no key material could be generated
    /// - `CodecError` - content could not be placed into the package
    pub fn synthesize(
        &self,
        title_id: TitleId,
        version: TitleVersion,
        content: &[u8],
    ) -> Result<Wad, TitlegenError> {
        let title_key = self.keys.title_key()?;

        let mut tmd = self.templates.tmd();
        tmd.title_id = title_id.get();
        tmd.title_version = version;
        tmd.contents.truncate(1);

        let mut ticket = self.templates.ticket();
        ticket.title_id = title_id.get();
        ticket.title_version = version;
        ticket.ticket_id = 0;
        ticket.set_title_key(&title_key, self.common_key);

        let mut wad = Wad::new(tmd, ticket, self.templates.cert_chain().to_vec());
        wad.set_content(0, content, &title_key)?;

        tracing::debug!(
            title_id = %title_id,
            version,
            content_len = content.len(),
            "synthesized package"
        );
        Ok(wad)
    }
}
