//! Titlegen configuration.
//!
//! Read from a JSON file whose keys follow the deployment's existing
//! `config.json` (`titlePath`, `zipPath`, ...).

use crate::codec::cipher::{parse_key_hex, AesKey};
use crate::identity::code::OrdinalEncoding;
use crate::TitlegenError;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

fn default_template_path() -> PathBuf {
    PathBuf::from("templates")
}

fn default_max_connections() -> u32 {
    5
}

/// Process configuration.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlegenConfig {
    /// Database user.
    #[serde(default)]
    pub user: String,

    /// Database password.
    #[serde(default)]
    pub pass: String,

    /// Database host, optionally with `:port`.
    #[serde(default)]
    pub host: String,

    /// Database name.
    #[serde(default)]
    pub db: String,

    /// Full connection URL; takes precedence over the individual fields.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Root of the per-title artifact tree.
    pub title_path: PathBuf,

    /// Directory holding uploaded content assets as `<uuid>.zip`.
    pub zip_path: PathBuf,

    /// Directory holding the `tmd`, `tik` and `certs` templates.
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,

    /// Common key wrapping title keys, as 32 hex characters.
    pub common_key: String,

    /// How SD title codes are derived from application IDs.
    #[serde(default)]
    pub ordinal_encoding: OrdinalEncoding,

    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl TitlegenConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, TitlegenError> {
        let json = fs::read_to_string(path).map_err(|e| {
            TitlegenError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, TitlegenError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TitlegenError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), TitlegenError> {
        if self.title_path.as_os_str().is_empty() {
            return Err(TitlegenError::ConfigError(
                "titlePath cannot be empty".to_string(),
            ));
        }
        if self.zip_path.as_os_str().is_empty() {
            return Err(TitlegenError::ConfigError(
                "zipPath cannot be empty".to_string(),
            ));
        }
        if self.template_path.as_os_str().is_empty() {
            return Err(TitlegenError::ConfigError(
                "templatePath cannot be empty".to_string(),
            ));
        }
        let has_parts = !self.user.is_empty() && !self.host.is_empty() && !self.db.is_empty();
        if self.database_url.is_none() && !has_parts {
            return Err(TitlegenError::ConfigError(
                "either databaseUrl or user, host and db must be set".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(TitlegenError::ConfigError(
                "maxConnections must be at least 1".to_string(),
            ));
        }
        self.common_key()?;
        Ok(())
    }

    /// Connection URL for the relational store.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}/{}",
                self.user, self.pass, self.host, self.db
            ),
        }
    }

    /// The decoded common key.
    pub fn common_key(&self) -> Result<AesKey, TitlegenError> {
        parse_key_hex(&self.common_key)
    }
}

impl fmt::Debug for TitlegenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TitlegenConfig")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("host", &self.host)
            .field("db", &self.db)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("title_path", &self.title_path)
            .field("zip_path", &self.zip_path)
            .field("template_path", &self.template_path)
            .field("common_key", &"<redacted>")
            .field("ordinal_encoding", &self.ordinal_encoding)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}
