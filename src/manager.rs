//! Title Manager - the main public API for titlegen.
//!
//! The `TitleManager` owns everything the lifecycle engine needs:
//! - Catalog handle (applications, versions, tickets)
//! - Parsed templates and the common key
//! - Title and asset roots
//!
//! It drives batch synthesis and package import.

use crate::assets::AssetSource;
use crate::catalog::models::{Application, ApplicationId};
use crate::catalog::postgres::PgCatalog;
use crate::catalog::CatalogStore;
use crate::codec::cipher::AesKey;
use crate::config::TitlegenConfig;
use crate::identity::channel::{Channel, ChannelSelector};
use crate::identity::code::OrdinalEncoding;
use crate::identity::resolver::TitleResolver;
use crate::identity::TitleId;
use crate::import::{ImportSummary, Importer};
use crate::keysource::{KeySource, OsKeySource};
use crate::ledger::{TitleVersion, VersionLedger};
use crate::storage::layout::TitleLayout;
use crate::storage::writer::TitleWriter;
use crate::synth::Synthesizer;
use crate::templates::TemplateStore;
use crate::TitlegenError;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Which applications a generate run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// One application.
    One(ApplicationId),
    /// Every application with a content asset, in ID order.
    All,
}

/// What a batch does when a target fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Abort the batch on the first failure.
    #[default]
    FailFast,
    /// Record the failure and continue with the next target.
    ///
    /// Fatal errors still abort.
    KeepGoing,
}

/// A successfully generated title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTitle {
    /// Channel the title was generated for.
    pub channel: Channel,
    /// Source application.
    pub application: ApplicationId,
    /// Resolved identity.
    pub title_id: TitleId,
    /// Version assigned by the ledger.
    pub version: TitleVersion,
}

/// A target that failed under [`BatchPolicy::KeepGoing`].
#[derive(Debug)]
pub struct TargetFailure {
    /// Requested channel.
    pub channel: Channel,
    /// Application that failed.
    pub application: ApplicationId,
    /// Why it failed.
    pub error: TitlegenError,
}

/// Outcome of a generate run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Targets that were fully persisted, in processing order.
    pub completed: Vec<GeneratedTitle>,
    /// Targets that failed.
    pub failed: Vec<TargetFailure>,
}

impl BatchReport {
    /// Whether every target succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Main title manager.
///
/// Create one instance per process and reuse it for every operation.
/// Operations run sequentially; concurrent runs are only safe across
/// processes, through the catalog's atomic version bump.
pub struct TitleManager {
    catalog: Arc<dyn CatalogStore>,
    keys: Arc<dyn KeySource>,
    templates: TemplateStore,
    layout: TitleLayout,
    assets: AssetSource,
    common_key: AesKey,
    encoding: OrdinalEncoding,
}

impl TitleManager {
    /// Connect to the configured relational store and load templates.
    ///
    /// # Errors
    /// - `ConfigError` - configuration or templates are invalid
    /// - `StoreUnavailable` - the store cannot be reached
    pub async fn connect(config: &TitlegenConfig) -> Result<Self, TitlegenError> {
        config.validate()?;
        let catalog = PgCatalog::connect(&config.database_url(), config.max_connections).await?;
        Self::build(config, Arc::new(catalog), Arc::new(OsKeySource))
    }

    /// Create a manager over an existing catalog.
    pub fn with_catalog(
        config: &TitlegenConfig,
        catalog: Arc<dyn CatalogStore>,
    ) -> Result<Self, TitlegenError> {
        config.validate()?;
        Self::build(config, catalog, Arc::new(OsKeySource))
    }

    /// Create a manager with a custom key source (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn with_key_source(
        config: &TitlegenConfig,
        catalog: Arc<dyn CatalogStore>,
        keys: Arc<dyn KeySource>,
    ) -> Result<Self, TitlegenError> {
        config.validate()?;
        Self::build(config, catalog, keys)
    }

    fn build(
        config: &TitlegenConfig,
        catalog: Arc<dyn CatalogStore>,
        keys: Arc<dyn KeySource>,
    ) -> Result<Self, TitlegenError> {
        let templates = TemplateStore::load(&config.template_path)?;

        Ok(Self {
            catalog,
            keys,
            templates,
            layout: TitleLayout::new(&config.title_path),
            assets: AssetSource::new(&config.zip_path),
            common_key: config.common_key()?,
            encoding: config.ordinal_encoding,
        })
    }

    /// Resolve the title identity of an application under a channel.
    pub async fn resolve(
        &self,
        channel: Channel,
        application: ApplicationId,
    ) -> Result<TitleId, TitlegenError> {
        TitleResolver::new(self.catalog.as_ref(), self.encoding)
            .resolve(channel, application)
            .await
    }

    /// Generate packages for the selected channels and applications.
    ///
    /// Channels are processed in order, and within a channel every target in
    /// application ID order. Each target completes before the next starts.
    ///
    /// # Errors
    /// Under `FailFast`, the first target failure. Under `KeepGoing`, only
    /// target-set resolution failures and fatal errors.
    pub async fn generate(
        &self,
        selector: ChannelSelector,
        target: Target,
        policy: BatchPolicy,
    ) -> Result<BatchReport, TitlegenError> {
        let applications = match target {
            Target::One(id) => vec![self.catalog.application(id).await?],
            Target::All => self.catalog.applications().await?,
        };

        let mut report = BatchReport::default();
        for channel in selector.channels() {
            for application in &applications {
                match self.generate_title(channel, application).await {
                    Ok(generated) => report.completed.push(generated),
                    Err(error) if policy == BatchPolicy::KeepGoing && !error.is_fatal() => {
                        tracing::error!(
                            %channel,
                            application_id = application.id,
                            error = %error,
                            "target failed, continuing"
                        );
                        report.failed.push(TargetFailure {
                            channel,
                            application: application.id,
                            error,
                        });
                    }
                    Err(error) => return Err(error),
                }
            }
        }

        tracing::info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            "generate finished"
        );
        Ok(report)
    }

    /// Generate, version and persist one title.
    ///
    /// The version bump is not undone if a later step fails.
    pub async fn generate_title(
        &self,
        channel: Channel,
        application: &Application,
    ) -> Result<GeneratedTitle, TitlegenError> {
        let title_id = self.resolve(channel, application.id).await?;
        if !channel.is_synthesizable() {
            return Err(TitlegenError::UnsupportedChannel(channel));
        }

        let version = VersionLedger::new(self.catalog.as_ref())
            .next_version(application.id)
            .await?;
        let content = self.assets.read(application.asset).await?;

        let wad = Synthesizer::new(&self.templates, self.keys.as_ref(), &self.common_key)
            .synthesize(title_id, version, &content)?;
        self.writer().persist(title_id, &wad).await?;

        tracing::info!(
            %channel,
            application_id = application.id,
            title_id = %title_id,
            version,
            "generated title"
        );
        Ok(GeneratedTitle {
            channel,
            application: application.id,
            title_id,
            version,
        })
    }

    /// Import a raw package.
    pub async fn import_package(&self, raw: &[u8]) -> Result<ImportSummary, TitlegenError> {
        Importer::new(self.writer()).import(raw).await
    }

    /// Import a package file.
    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary, TitlegenError> {
        let raw = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => TitlegenError::NotFound(format!("package {}", path.display())),
            _ => TitlegenError::IoFailure(format!("Failed to read {}: {}", path.display(), e)),
        })?;
        self.import_package(&raw).await
    }

    /// The catalog backing this manager.
    pub fn catalog(&self) -> &dyn CatalogStore {
        self.catalog.as_ref()
    }

    /// The title tree layout.
    pub fn layout(&self) -> &TitleLayout {
        &self.layout
    }

    fn writer(&self) -> TitleWriter<'_> {
        TitleWriter::new(&self.layout, self.catalog.as_ref())
    }
}
