//! Title identities and how each channel resolves them.

pub mod channel;
pub mod code;
pub mod resolver;

use crate::TitlegenError;
use std::fmt;

/// A 64-bit title identity, the storage key for artifacts and tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TitleId(u64);

impl TitleId {
    /// Wrap a raw title ID.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Parse the 16-hex-digit form stored in the catalog.
    pub fn from_hex(s: &str) -> Result<Self, TitlegenError> {
        let s = s.trim();
        if s.len() != 16 {
            return Err(TitlegenError::NotFound(format!(
                "title ID '{}' is not 16 hex digits",
                s
            )));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| TitlegenError::NotFound(format!("title ID '{}' is not hex: {}", s, e)))
    }
}

impl fmt::Display for TitleId {
    /// Lowercase, zero-padded to 16 digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for TitleId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
