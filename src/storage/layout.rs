//! Artifact paths under the title root.
//!
//! ```text
//! <title_root>/<title_id hex16>/tmd        TMD followed by the certificate chain
//! <title_root>/<title_id hex16>/<id hex8>  encrypted content, no extension
//! ```

use crate::identity::TitleId;
use std::path::PathBuf;

/// File name of the metadata artifact.
pub const TMD_FILE_NAME: &str = "tmd";

/// File name of a content artifact.
pub fn content_file_name(content_id: u32) -> String {
    format!("{:08x}", content_id)
}

/// Resolves artifact paths for titles.
#[derive(Debug, Clone)]
pub struct TitleLayout {
    root: PathBuf,
}

impl TitleLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding a title's artifacts.
    pub fn title_dir(&self, title_id: TitleId) -> PathBuf {
        self.root.join(title_id.to_string())
    }

    /// Path of a title's metadata artifact.
    pub fn tmd_path(&self, title_id: TitleId) -> PathBuf {
        self.title_dir(title_id).join(TMD_FILE_NAME)
    }

    /// Path of one content artifact.
    pub fn content_path(&self, title_id: TitleId, content_id: u32) -> PathBuf {
        self.title_dir(title_id).join(content_file_name(content_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = TitleLayout::new("/srv/titles");
        let title = TitleId::new(0x0001_0008_5341_4141);

        assert_eq!(
            layout.tmd_path(title),
            PathBuf::from("/srv/titles/0001000853414141/tmd")
        );
        assert_eq!(
            layout.content_path(title, 0),
            PathBuf::from("/srv/titles/0001000853414141/00000000")
        );
    }

    #[test]
    fn test_content_file_name_is_lowercase() {
        assert_eq!(content_file_name(0xDEAD_BEEF), "deadbeef");
        assert_eq!(content_file_name(0x1f), "0000001f");
    }
}
