//! Title key generation with an injectable source for deterministic tests.

use crate::codec::cipher::{AesKey, KEY_LEN};
use crate::TitlegenError;
use rand::rngs::OsRng;
use rand::RngCore;

/// Source of fresh title keys.
pub trait KeySource: Send + Sync {
    /// Produce a new title key.
    ///
    /// Must fail rather than return weak or default key material.
    fn title_key(&self) -> Result<AesKey, TitlegenError>;
}

/// Keys drawn from the operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsKeySource;

impl KeySource for OsKeySource {
    fn title_key(&self) -> Result<AesKey, TitlegenError> {
        let mut key = [0u8; KEY_LEN];
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| TitlegenError::RandomnessUnavailable(e.to_string()))?;
        Ok(key)
    }
}

/// Key source returning the same key every time.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone)]
pub struct FixedKeySource {
    key: AesKey,
}

#[cfg(any(test, feature = "test-seams"))]
impl FixedKeySource {
    /// Create a source that always yields `key`.
    pub fn new(key: AesKey) -> Self {
        Self { key }
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl KeySource for FixedKeySource {
    fn title_key(&self) -> Result<AesKey, TitlegenError> {
        Ok(self.key)
    }
}

/// Key source whose randomness is always unavailable.
#[cfg(test)]
pub(crate) struct FailingKeySource;

#[cfg(test)]
impl KeySource for FailingKeySource {
    fn title_key(&self) -> Result<AesKey, TitlegenError> {
        Err(TitlegenError::RandomnessUnavailable(
            "entropy source closed".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_key_source_returns_fresh_keys() {
        let source = OsKeySource;
        let a = source.title_key().unwrap();
        let b = source.title_key().unwrap();
        // 2^-128 chance of a false failure.
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_key_source_is_deterministic() {
        let source = FixedKeySource::new([9; KEY_LEN]);
        assert_eq!(source.title_key().unwrap(), [9; KEY_LEN]);
        assert_eq!(source.title_key().unwrap(), [9; KEY_LEN]);
    }

    #[test]
    fn failing_key_source_is_fatal() {
        let err = FailingKeySource.title_key().unwrap_err();
        assert!(err.is_fatal());
    }
}
