//! Package templates loaded once at startup.
//!
//! The template directory holds three files:
//! - `tmd` - metadata record with at least one content record
//! - `tik` - ticket
//! - `certs` - certificate chain appended to every stored TMD

use crate::codec::ticket::Ticket;
use crate::codec::tmd::Tmd;
use crate::TitlegenError;
use std::fs;
use std::path::Path;

/// File name of the TMD template.
pub const TMD_TEMPLATE: &str = "tmd";
/// File name of the ticket template.
pub const TICKET_TEMPLATE: &str = "tik";
/// File name of the certificate chain.
pub const CERTS_TEMPLATE: &str = "certs";

/// Parsed, immutable package templates.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    tmd: Tmd,
    ticket: Ticket,
    cert_chain: Vec<u8>,
}

impl TemplateStore {
    /// Load and validate the templates in `dir`.
    pub fn load(dir: &Path) -> Result<Self, TitlegenError> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read(&path).map_err(|e| {
                TitlegenError::ConfigError(format!(
                    "Failed to read template {}: {}",
                    path.display(),
                    e
                ))
            })
        };

        let store = Self::from_bytes(
            &read(TMD_TEMPLATE)?,
            &read(TICKET_TEMPLATE)?,
            read(CERTS_TEMPLATE)?,
        )?;
        tracing::debug!(dir = %dir.display(), cert_chain_len = store.cert_chain.len(), "loaded templates");
        Ok(store)
    }

    /// Build templates from raw bytes.
    pub fn from_bytes(tmd: &[u8], ticket: &[u8], cert_chain: Vec<u8>) -> Result<Self, TitlegenError> {
        let tmd = Tmd::parse(tmd)
            .map_err(|e| TitlegenError::ConfigError(format!("Invalid TMD template: {}", e)))?;
        if tmd.contents.is_empty() {
            return Err(TitlegenError::ConfigError(
                "TMD template has no content record".to_string(),
            ));
        }
        let ticket = Ticket::parse(ticket)
            .map_err(|e| TitlegenError::ConfigError(format!("Invalid ticket template: {}", e)))?;
        if cert_chain.is_empty() {
            return Err(TitlegenError::ConfigError(
                "certificate chain template is empty".to_string(),
            ));
        }

        Ok(Self {
            tmd,
            ticket,
            cert_chain,
        })
    }

    /// A fresh copy of the TMD template.
    pub fn tmd(&self) -> Tmd {
        self.tmd.clone()
    }

    /// A fresh copy of the ticket template.
    pub fn ticket(&self) -> Ticket {
        self.ticket.clone()
    }

    /// The certificate chain.
    pub fn cert_chain(&self) -> &[u8] {
        &self.cert_chain
    }
}
