//! Read-only access to uploaded content assets.

use crate::TitlegenError;
use std::io::ErrorKind;
use std::path::PathBuf;
use uuid::Uuid;

/// Content assets stored as `<root>/<uuid>.zip`.
#[derive(Debug, Clone)]
pub struct AssetSource {
    root: PathBuf,
}

impl AssetSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of an asset.
    pub fn path(&self, asset: Uuid) -> PathBuf {
        self.root.join(format!("{}.zip", asset))
    }

    /// Read an asset's bytes unmodified.
    pub async fn read(&self, asset: Uuid) -> Result<Vec<u8>, TitlegenError> {
        let path = self.path(asset);
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                TitlegenError::NotFound(format!("content asset {}", path.display()))
            }
            _ => TitlegenError::IoFailure(format!("Failed to read {}: {}", path.display(), e)),
        })
    }
}
