//! Title metadata (TMD).
//!
//! Layout after the 0x140-byte signed blob header:
//! ```text
//! 0x18C  title_id        u64
//! 0x1DC  title_version   u16
//! 0x1DE  num_contents    u16
//! 0x1E4  content records, 36 bytes each:
//!        content_id u32 | index u16 | type u16 | size u64 | sha1 [u8; 20]
//! ```
//! All other header bytes are carried through unchanged.

use crate::codec::{be_u16, be_u32, be_u64, put, slice};
use crate::TitlegenError;

/// Length of the fixed TMD header, signature included.
pub const TMD_HEADER_LEN: usize = 0x1E4;

/// Length of one content record.
pub const CONTENT_RECORD_LEN: usize = 36;

const TITLE_ID_OFFSET: usize = 0x18C;
const TITLE_VERSION_OFFSET: usize = 0x1DC;
const NUM_CONTENTS_OFFSET: usize = 0x1DE;

/// Descriptor of one content entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    /// Content ID; also the on-disk file name.
    pub content_id: u32,
    /// Content index; seeds the content IV.
    pub index: u16,
    /// Content type flags.
    pub content_type: u16,
    /// Decrypted size in bytes.
    pub size: u64,
    /// SHA-1 of the decrypted content.
    pub hash: [u8; 20],
}

impl ContentRecord {
    fn parse(bytes: &[u8]) -> Self {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&bytes[16..36]);
        Self {
            content_id: be_u32(bytes, 0),
            index: be_u16(bytes, 4),
            content_type: be_u16(bytes, 6),
            size: be_u64(bytes, 8),
            hash,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.content_id.to_be_bytes());
        out.extend_from_slice(&self.index.to_be_bytes());
        out.extend_from_slice(&self.content_type.to_be_bytes());
        out.extend_from_slice(&self.size.to_be_bytes());
        out.extend_from_slice(&self.hash);
    }
}

/// A parsed TMD.
#[derive(Debug, Clone)]
pub struct Tmd {
    header: Vec<u8>,
    /// Title identity.
    pub title_id: u64,
    /// Title version.
    pub title_version: u16,
    /// Content descriptors, in package order.
    pub contents: Vec<ContentRecord>,
}

impl Tmd {
    /// Parse a TMD, ignoring any trailing bytes (such as a certificate chain).
    pub fn parse(bytes: &[u8]) -> Result<Self, TitlegenError> {
        let header = slice(bytes, 0, TMD_HEADER_LEN, "TMD header")?;
        let count = be_u16(header, NUM_CONTENTS_OFFSET) as usize;
        let records = slice(
            bytes,
            TMD_HEADER_LEN,
            count * CONTENT_RECORD_LEN,
            "TMD content records",
        )?;

        Ok(Self {
            header: header.to_vec(),
            title_id: be_u64(header, TITLE_ID_OFFSET),
            title_version: be_u16(header, TITLE_VERSION_OFFSET),
            contents: records
                .chunks_exact(CONTENT_RECORD_LEN)
                .map(ContentRecord::parse)
                .collect(),
        })
    }

    /// Serialize, writing the edited fields back into the header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = self.header.clone();
        put(&mut header, TITLE_ID_OFFSET, &self.title_id.to_be_bytes());
        put(&mut header, TITLE_VERSION_OFFSET, &self.title_version.to_be_bytes());
        // More than u16::MAX records cannot be described; parse never produces that.
        put(
            &mut header,
            NUM_CONTENTS_OFFSET,
            &(self.contents.len() as u16).to_be_bytes(),
        );

        let mut out = header;
        out.reserve(self.contents.len() * CONTENT_RECORD_LEN);
        for record in &self.contents {
            record.write(&mut out);
        }
        out
    }
}

/// Two TMDs are equal when they serialize identically.
impl PartialEq for Tmd {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Tmd {}
