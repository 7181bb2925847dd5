//! Title package codec.
//!
//! Reads and writes the three records that make up a package and the WAD
//! container that bundles them:
//! - [`tmd::Tmd`] - title metadata with per-content size and SHA-1 digest
//! - [`ticket::Ticket`] - license carrying the wrapped title key
//! - [`wad::Wad`] - container with certificate chain, ticket, TMD and contents
//!
//! Signed blob headers and fields the engine never edits are preserved
//! byte-for-byte. Parse failures are reported as `CodecError`.

pub mod cipher;
pub mod ticket;
pub mod tmd;
pub mod wad;

use crate::TitlegenError;

/// Borrow `len` bytes at `offset`, or fail naming the record being read.
pub(crate) fn slice<'a>(
    bytes: &'a [u8],
    offset: usize,
    len: usize,
    what: &str,
) -> Result<&'a [u8], TitlegenError> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            TitlegenError::CodecError(format!(
                "{} truncated: need {} bytes at offset {:#x}, have {}",
                what,
                len,
                offset,
                bytes.len()
            ))
        })
}

pub(crate) fn be_u16(bytes: &[u8], offset: usize) -> u16 {
    let mut buf = [0u8; 2];
    buf.copy_from_slice(&bytes[offset..offset + 2]);
    u16::from_be_bytes(buf)
}

pub(crate) fn be_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(buf)
}

pub(crate) fn be_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_be_bytes(buf)
}

pub(crate) fn put(bytes: &mut [u8], offset: usize, value: &[u8]) {
    bytes[offset..offset + value.len()].copy_from_slice(value);
}
