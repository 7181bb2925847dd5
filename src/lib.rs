//! # Titlegen
//!
//! **Title package synthesis and import for a catalog-backed title store.**
//!
//! Titlegen builds installable title packages (TMD, ticket and encrypted
//! contents) for the applications in a PostgreSQL catalog, and lays them out
//! as per-title artifact directories plus a ticket table.
//!
//! ## Features
//!
//! - **Synthesis** - fresh title key, next ledger version, content encrypted from an uploaded asset
//! - **Import** - existing WAD packages redistributed into the same layout
//! - **Atomic versioning** - `UPDATE ... RETURNING` keeps versions unique across processes
//! - **Idempotent storage** - artifacts are overwritten via temp file + rename
//!
//! ## Quickstart
//!
//! ```no_run
//! use titlegen::{BatchPolicy, ChannelSelector, Target, TitleManager, TitlegenConfig};
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), titlegen::TitlegenError> {
//! let config = TitlegenConfig::load(Path::new("config.json"))?;
//! let manager = TitleManager::connect(&config).await?;
//!
//! let report = manager
//!     .generate(ChannelSelector::All, Target::One(7), BatchPolicy::FailFast)
//!     .await?;
//! for title in &report.completed {
//!     println!("{} v{}", title.title_id, title.version);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Channels
//!
//! - `sd` - identity derived from the application ID, fully synthesized
//! - `nand`, `forwarder` - identity looked up from the catalog; synthesis is
//!   not supported and fails with [`TitlegenError::UnsupportedChannel`]
//!
//! See [`TitlegenConfig`] for configuration.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod config;
pub mod errors;
pub mod keysource;

// Container codec
pub mod codec;

// Identity and catalog
pub mod catalog;
pub mod identity;

// Lifecycle engine
pub mod assets;
pub mod import;
pub mod ledger;
pub mod storage;
pub mod synth;
pub mod templates;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use catalog::models::{Application, ApplicationId, TicketRow};
pub use catalog::CatalogStore;
pub use config::TitlegenConfig;
pub use errors::TitlegenError;
pub use identity::channel::{Channel, ChannelSelector};
pub use identity::code::OrdinalEncoding;
pub use identity::TitleId;
pub use import::ImportSummary;
pub use keysource::{KeySource, OsKeySource};
pub use ledger::TitleVersion;
pub use manager::{BatchPolicy, BatchReport, GeneratedTitle, Target, TargetFailure, TitleManager};

#[cfg(any(test, feature = "test-seams"))]
pub use keysource::FixedKeySource;
