//! Shared fixtures: template files, a config pointing at a temp tree, and
//! externally produced packages.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use titlegen::codec::ticket::{Ticket, TICKET_LEN};
use titlegen::codec::tmd::{Tmd, CONTENT_RECORD_LEN, TMD_HEADER_LEN};
use titlegen::codec::wad::Wad;
use titlegen::catalog::memory::MemoryCatalog;
use titlegen::templates::{CERTS_TEMPLATE, TICKET_TEMPLATE, TMD_TEMPLATE};
use titlegen::{ApplicationId, TitleManager, TitlegenConfig};
use uuid::Uuid;

pub const COMMON_KEY_HEX: &str = "0123456789abcdef0123456789abcdef";
pub const COMMON_KEY: [u8; 16] = [
    0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd,
    0xef,
];
pub const CERTS: &[u8] = b"Root-CA00000001 certificate chain";

/// Offset of the ticket ID inside a serialized ticket.
pub const TICKET_ID_OFFSET: usize = 0x1D0;

/// A TMD template with one content record (ID 0, index 0).
pub fn tmd_template() -> Vec<u8> {
    let mut bytes = vec![0u8; TMD_HEADER_LEN + CONTENT_RECORD_LEN];
    bytes[0..4].copy_from_slice(&0x0001_0001u32.to_be_bytes());
    bytes[0x140..0x140 + 26].copy_from_slice(b"Root-CA00000001-CP00000004");
    bytes[0x1DE..0x1E0].copy_from_slice(&1u16.to_be_bytes());
    // content type: normal
    bytes[TMD_HEADER_LEN + 6..TMD_HEADER_LEN + 8].copy_from_slice(&1u16.to_be_bytes());
    bytes
}

/// A ticket template carrying a non-zero ticket ID.
pub fn ticket_template() -> Vec<u8> {
    let mut bytes = vec![0u8; TICKET_LEN];
    bytes[0..4].copy_from_slice(&0x0001_0001u32.to_be_bytes());
    bytes[0x140..0x140 + 26].copy_from_slice(b"Root-CA00000001-XS00000003");
    bytes[TICKET_ID_OFFSET..TICKET_ID_OFFSET + 8]
        .copy_from_slice(&0x0003_0000_aaaa_bbbbu64.to_be_bytes());
    bytes
}

/// An externally produced package with two contents.
pub fn external_package(title_id: u64, version: u16) -> Wad {
    let mut tmd_bytes = tmd_template();
    tmd_bytes[0x1DE..0x1E0].copy_from_slice(&2u16.to_be_bytes());
    let mut second = tmd_bytes[TMD_HEADER_LEN..].to_vec();
    second[0..4].copy_from_slice(&0x0000_0001u32.to_be_bytes());
    second[4..6].copy_from_slice(&1u16.to_be_bytes());
    tmd_bytes.extend_from_slice(&second);

    let mut tmd = Tmd::parse(&tmd_bytes).unwrap();
    tmd.title_id = title_id;
    tmd.title_version = version;

    let mut ticket = Ticket::parse(&ticket_template()).unwrap();
    ticket.title_id = title_id;
    ticket.title_version = version;
    let title_key = [0x77; 16];
    ticket.set_title_key(&title_key, &COMMON_KEY);

    let mut wad = Wad::new(tmd, ticket, b"external certificate chain".to_vec());
    wad.set_content(0, b"boot content", &title_key).unwrap();
    wad.set_content(1, &[0xa5; 300], &title_key).unwrap();
    wad
}

/// A temporary deployment: title tree, asset store, templates and catalog.
pub struct Deployment {
    pub root: TempDir,
    pub config: TitlegenConfig,
    pub catalog: Arc<MemoryCatalog>,
}

impl Deployment {
    pub fn new(encoding: &str) -> Self {
        let root = TempDir::new().unwrap();
        let templates = root.path().join("templates");
        for dir in [root.path().join("titles"), root.path().join("assets"), templates.clone()] {
            fs::create_dir(dir).unwrap();
        }
        fs::write(templates.join(TMD_TEMPLATE), tmd_template()).unwrap();
        fs::write(templates.join(TICKET_TEMPLATE), ticket_template()).unwrap();
        fs::write(templates.join(CERTS_TEMPLATE), CERTS).unwrap();

        let json = serde_json::json!({
            "user": "titlegen",
            "pass": "secret",
            "host": "localhost",
            "db": "catalog",
            "titlePath": root.path().join("titles"),
            "zipPath": root.path().join("assets"),
            "templatePath": templates,
            "commonKey": COMMON_KEY_HEX,
            "ordinalEncoding": encoding,
        });
        let config = TitlegenConfig::from_json(&json.to_string()).unwrap();

        Self {
            root,
            config,
            catalog: Arc::new(MemoryCatalog::new()),
        }
    }

    /// Register an application whose asset holds `content`.
    pub fn add_application(&self, id: ApplicationId, version: i32, content: &[u8]) -> Uuid {
        let asset = Uuid::new_v4();
        fs::write(self.config.zip_path.join(format!("{}.zip", asset)), content).unwrap();
        self.catalog.insert_application(id, Some(asset), version);
        asset
    }

    pub fn manager(&self) -> TitleManager {
        TitleManager::with_catalog(&self.config, self.catalog.clone()).unwrap()
    }

    pub fn titles(&self) -> &Path {
        &self.config.title_path
    }
}

/// Sorted file names in a directory.
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
