//! Storage writer with atomic artifact writes.
//!
//! Every artifact goes through temp file + rename, so readers see either the
//! previous generation or the new one. No transaction spans the files and the
//! ticket row; re-running `persist` repairs a partial write.

use crate::catalog::CatalogStore;
use crate::codec::wad::Wad;
use crate::identity::TitleId;
use crate::storage::layout::{content_file_name, TitleLayout, TMD_FILE_NAME};
use crate::TitlegenError;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// Permissions of a newly created title directory.
pub const TITLE_DIR_MODE: u32 = 0o755;

/// Writes packages to the title tree and the ticket table.
pub struct TitleWriter<'a> {
    layout: &'a TitleLayout,
    catalog: &'a dyn CatalogStore,
}

impl<'a> TitleWriter<'a> {
    /// Create a writer.
    pub fn new(layout: &'a TitleLayout, catalog: &'a dyn CatalogStore) -> Self {
        Self { layout, catalog }
    }

    /// Persist a package under `title_id`, overwriting any previous artifacts.
    ///
    /// # Errors
    /// - `IoFailure` - directory creation or a file write failed
    /// - `StoreUnavailable` - the ticket upsert failed
    pub async fn persist(&self, title_id: TitleId, wad: &Wad) -> Result<(), TitlegenError> {
        let dir = self.layout.title_dir(title_id);
        ensure_dir(&dir).await?;

        let mut tmd = wad.tmd.to_bytes();
        tmd.extend_from_slice(&wad.cert_chain);
        write_atomic(&dir, TMD_FILE_NAME, &tmd).await?;
        tracing::debug!(title_id = %title_id, len = tmd.len(), "wrote tmd");

        for (record, encrypted) in wad.entries() {
            let name = content_file_name(record.content_id);
            write_atomic(&dir, &name, encrypted).await?;
            tracing::debug!(
                title_id = %title_id,
                content_id = %name,
                len = encrypted.len(),
                "wrote content"
            );
        }

        let version = i32::from(wad.ticket.title_version);
        self.catalog
            .upsert_ticket(title_id, &wad.ticket.to_bytes(), version)
            .await?;
        tracing::debug!(title_id = %title_id, version, "upserted ticket");
        Ok(())
    }
}

/// Create `dir` if needed; losing a creation race is not an error.
async fn ensure_dir(dir: &Path) -> Result<(), TitlegenError> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    builder.mode(TITLE_DIR_MODE);

    match builder.create(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(TitlegenError::IoFailure(format!(
            "Failed to create {}: {}",
            dir.display(),
            e
        ))),
    }
}

async fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> Result<(), TitlegenError> {
    let target = dir.join(name);
    // Unique per writer so concurrent processes never share a temp file.
    let temp = dir.join(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));

    // A failed write may leave a partial temp file behind.
    if let Err(e) = fs::write(&temp, contents).await {
        let _ = fs::remove_file(&temp).await;
        return Err(TitlegenError::IoFailure(format!(
            "Failed to write {}: {}",
            temp.display(),
            e
        )));
    }

    if let Err(e) = fs::rename(&temp, &target).await {
        let _ = fs::remove_file(&temp).await;
        return Err(TitlegenError::IoFailure(format!(
            "Failed to rename into {}: {}",
            target.display(),
            e
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalog;
    use crate::codec::wad::tests::sample_wad;
    use std::fs as std_fs;
    use tempfile::TempDir;

    const TITLE: TitleId = TitleId::new(0x0001_0001_dead_beef);

    fn dir_listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std_fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_persist_writes_artifacts() {
        let root = TempDir::new().unwrap();
        let layout = TitleLayout::new(root.path());
        let catalog = MemoryCatalog::new();
        let wad = sample_wad(TITLE.get(), 3);

        TitleWriter::new(&layout, &catalog)
            .persist(TITLE, &wad)
            .await
            .unwrap();

        let dir = layout.title_dir(TITLE);
        assert_eq!(dir_listing(&dir), vec!["00000000", "00000001", "tmd"]);

        let mut expected_tmd = wad.tmd.to_bytes();
        expected_tmd.extend_from_slice(&wad.cert_chain);
        assert_eq!(std_fs::read(layout.tmd_path(TITLE)).unwrap(), expected_tmd);
        assert_eq!(
            std_fs::read(layout.content_path(TITLE, 1)).unwrap(),
            wad.contents[1]
        );

        let row = catalog.ticket(TITLE).await.unwrap().unwrap();
        assert_eq!(row.version, 3);
        assert_eq!(row.ticket, wad.ticket.to_bytes());
    }

    #[tokio::test]
    async fn test_persist_is_idempotent() {
        let root = TempDir::new().unwrap();
        let layout = TitleLayout::new(root.path());
        let catalog = MemoryCatalog::new();
        let wad = sample_wad(TITLE.get(), 3);
        let writer = TitleWriter::new(&layout, &catalog);

        writer.persist(TITLE, &wad).await.unwrap();
        let first_tmd = std_fs::read(layout.tmd_path(TITLE)).unwrap();
        let first_row = catalog.ticket(TITLE).await.unwrap();

        writer.persist(TITLE, &wad).await.unwrap();
        assert_eq!(std_fs::read(layout.tmd_path(TITLE)).unwrap(), first_tmd);
        assert_eq!(catalog.ticket(TITLE).await.unwrap(), first_row);
        assert_eq!(dir_listing(&layout.title_dir(TITLE)).len(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_title_dir_mode() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let dir = root.path().join("0001000853414141");
        ensure_dir(&dir).await.unwrap();
        ensure_dir(&dir).await.unwrap();

        let mode = std_fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        // Umask may clear group/other write bits, never add them.
        assert_eq!(mode & !TITLE_DIR_MODE, 0);
        assert_eq!(mode & 0o700, 0o700);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_temp_files() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("title");
        ensure_dir(&dir).await.unwrap();

        // Rename fails: the target is a non-empty directory.
        std_fs::create_dir(dir.join("tmd")).unwrap();
        std_fs::write(dir.join("tmd").join("keep"), b"x").unwrap();
        let result = write_atomic(&dir, "tmd", b"payload").await;
        assert!(matches!(result, Err(TitlegenError::IoFailure(_))));
        assert_eq!(dir_listing(&dir), vec!["tmd"]);

        // Write fails: the directory is gone.
        let gone = root.path().join("gone");
        let result = write_atomic(&gone, "00000000", b"payload").await;
        assert!(matches!(result, Err(TitlegenError::IoFailure(_))));
        assert_eq!(dir_listing(root.path()), vec!["title"]);
    }

    #[tokio::test]
    async fn test_missing_root_is_io_failure() {
        let root = TempDir::new().unwrap();
        let layout = TitleLayout::new(root.path().join("missing"));
        let catalog = MemoryCatalog::new();

        let result = TitleWriter::new(&layout, &catalog)
            .persist(TITLE, &sample_wad(TITLE.get(), 1))
            .await;
        assert!(matches!(result, Err(TitlegenError::IoFailure(_))));
        assert_eq!(catalog.ticket_count(), 0);
    }
}
