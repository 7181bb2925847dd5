//! Titlegen error types.

use crate::identity::channel::Channel;
use thiserror::Error;

/// Errors that can occur while synthesizing, importing or storing titles.
#[derive(Debug, Error)]
pub enum TitlegenError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Unknown application, title mapping, or content asset.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The OS random source could not produce key material.
    #[error("Randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// An imported package could not be parsed.
    #[error("Malformed package: {0}")]
    MalformedPackage(String),

    /// Relational store connectivity or query failure.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Filesystem read or write failure.
    #[error("I/O failure: {0}")]
    IoFailure(String),

    /// Synthesis requested for a channel without a packaging procedure.
    #[error("Synthesis is not supported for channel {0}")]
    UnsupportedChannel(Channel),

    /// Template or content codec failure outside of import parsing.
    #[error("Codec error: {0}")]
    CodecError(String),

    /// The ledger returned a version the metadata record cannot hold.
    #[error("Version {0} is outside the title version range")]
    VersionOutOfRange(i64),
}

impl TitlegenError {
    /// Whether this error must abort a batch regardless of policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TitlegenError::RandomnessUnavailable(_))
    }
}
