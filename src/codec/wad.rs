//! WAD container: the distributable form of a title package.
//!
//! ```text
//! 0x00  header_size   u32  (0x20)
//! 0x04  wad_type      u16  ("Is")
//! 0x06  wad_version   u16
//! 0x08  cert_size     u32
//! 0x0C  crl_size      u32
//! 0x10  ticket_size   u32
//! 0x14  tmd_size      u32
//! 0x18  data_size     u32
//! 0x1C  footer_size   u32
//! ```
//! Sections follow in that order, each starting on a 64-byte boundary. The
//! data section holds every content's ciphertext in TMD order, each padded to
//! 64 bytes.

use crate::codec::cipher::{align, content_iv, decrypt_cbc, encrypt_cbc, sha1, AesKey, BLOCK_LEN};
use crate::codec::ticket::Ticket;
use crate::codec::tmd::{ContentRecord, Tmd};
use crate::codec::{be_u16, be_u32, slice};
use crate::TitlegenError;

/// Length of the WAD header.
pub const WAD_HEADER_LEN: usize = 0x20;

/// Alignment of every section and content.
pub const SECTION_ALIGN: usize = 64;

const WAD_TYPE_INSTALLABLE: u16 = 0x4973; // "Is"
const WAD_TYPE_BOOT2: u16 = 0x6962; // "ib"

/// A complete title package held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wad {
    /// Certificate chain used to verify the ticket and TMD signatures.
    pub cert_chain: Vec<u8>,
    /// Certificate revocation list; usually empty.
    pub crl: Vec<u8>,
    /// License record.
    pub ticket: Ticket,
    /// Metadata record.
    pub tmd: Tmd,
    /// Encrypted contents, parallel to `tmd.contents`.
    pub contents: Vec<Vec<u8>>,
    /// Trailing metadata; usually empty.
    pub footer: Vec<u8>,
}

impl Wad {
    /// Assemble a package with empty content slots for every TMD record.
    pub fn new(tmd: Tmd, ticket: Ticket, cert_chain: Vec<u8>) -> Self {
        let slots = tmd.contents.len();
        Self {
            cert_chain,
            crl: Vec::new(),
            ticket,
            tmd,
            contents: vec![Vec::new(); slots],
            footer: Vec::new(),
        }
    }

    /// Parse a WAD.
    pub fn parse(bytes: &[u8]) -> Result<Self, TitlegenError> {
        let header = slice(bytes, 0, WAD_HEADER_LEN, "WAD header")?;

        let header_size = be_u32(header, 0) as usize;
        if header_size != WAD_HEADER_LEN {
            return Err(TitlegenError::CodecError(format!(
                "unexpected WAD header size {:#x}",
                header_size
            )));
        }
        let wad_type = be_u16(header, 4);
        if wad_type != WAD_TYPE_INSTALLABLE && wad_type != WAD_TYPE_BOOT2 {
            return Err(TitlegenError::CodecError(format!(
                "unknown WAD type {:#06x}",
                wad_type
            )));
        }

        let section_size = |offset: usize| be_u32(header, offset) as usize;
        let mut cursor = SectionCursor::new(bytes);
        let cert_chain = cursor.take(section_size(0x08), "certificate chain")?.to_vec();
        let crl = cursor.take(section_size(0x0C), "CRL")?.to_vec();
        let ticket = Ticket::parse(cursor.take(section_size(0x10), "ticket")?)?;
        let tmd = Tmd::parse(cursor.take(section_size(0x14), "TMD")?)?;
        let data = cursor.take(section_size(0x18), "content data")?;
        let footer = cursor.take(section_size(0x1C), "footer")?.to_vec();

        if ticket.title_id != tmd.title_id {
            return Err(TitlegenError::CodecError(format!(
                "ticket title {:016x} does not match TMD title {:016x}",
                ticket.title_id, tmd.title_id
            )));
        }

        let mut contents = Vec::with_capacity(tmd.contents.len());
        let mut offset = 0usize;
        for record in &tmd.contents {
            let size = usize::try_from(record.size)
                .ok()
                .filter(|size| *size <= data.len())
                .ok_or_else(|| {
                    TitlegenError::CodecError(format!(
                        "content {:08x} size {} exceeds data section",
                        record.content_id, record.size
                    ))
                })?;
            let len = align(size, BLOCK_LEN);
            contents.push(slice(data, offset, len, "content")?.to_vec());
            offset = align(offset + len, SECTION_ALIGN);
        }

        Ok(Self {
            cert_chain,
            crl,
            ticket,
            tmd,
            contents,
            footer,
        })
    }

    /// Serialize to the container format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let ticket = self.ticket.to_bytes();
        let tmd = self.tmd.to_bytes();
        let mut data = Vec::new();
        for content in &self.contents {
            data.extend_from_slice(content);
            data.resize(align(data.len(), SECTION_ALIGN), 0);
        }

        let sizes = [
            self.cert_chain.len(),
            self.crl.len(),
            ticket.len(),
            tmd.len(),
            data.len(),
            self.footer.len(),
        ];

        let mut out = Vec::new();
        out.extend_from_slice(&(WAD_HEADER_LEN as u32).to_be_bytes());
        out.extend_from_slice(&WAD_TYPE_INSTALLABLE.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        for size in sizes {
            out.extend_from_slice(&(size as u32).to_be_bytes());
        }

        for section in [
            self.cert_chain.as_slice(),
            self.crl.as_slice(),
            &ticket,
            &tmd,
            &data,
            self.footer.as_slice(),
        ] {
            out.resize(align(out.len(), SECTION_ALIGN), 0);
            out.extend_from_slice(section);
        }
        out
    }

    /// Encrypt `plaintext` into a content slot and update its TMD record.
    ///
    /// The record's size and SHA-1 are back-filled from the plaintext.
    pub fn set_content(
        &mut self,
        position: usize,
        plaintext: &[u8],
        title_key: &AesKey,
    ) -> Result<(), TitlegenError> {
        let record = self.tmd.contents.get_mut(position).ok_or_else(|| {
            TitlegenError::CodecError(format!("no content record at position {}", position))
        })?;
        record.size = plaintext.len() as u64;
        record.hash = sha1(plaintext);
        let encrypted = encrypt_cbc(title_key, &content_iv(record.index), plaintext);

        if self.contents.len() < self.tmd.contents.len() {
            self.contents.resize(self.tmd.contents.len(), Vec::new());
        }
        self.contents[position] = encrypted;
        Ok(())
    }

    /// Decrypt a content slot and verify it against its TMD record.
    pub fn decrypt_content(
        &self,
        position: usize,
        title_key: &AesKey,
    ) -> Result<Vec<u8>, TitlegenError> {
        let (record, encrypted) = self.entries().nth(position).ok_or_else(|| {
            TitlegenError::CodecError(format!("no content at position {}", position))
        })?;
        decrypt_content(record, encrypted, title_key)
    }

    /// Content records paired with their ciphertext.
    pub fn entries(&self) -> impl Iterator<Item = (&ContentRecord, &[u8])> {
        self.tmd
            .contents
            .iter()
            .zip(self.contents.iter().map(Vec::as_slice))
    }
}

/// Decrypt one content and check its size and digest.
pub fn decrypt_content(
    record: &ContentRecord,
    encrypted: &[u8],
    title_key: &AesKey,
) -> Result<Vec<u8>, TitlegenError> {
    let mut plain = decrypt_cbc(title_key, &content_iv(record.index), encrypted)?;
    let size = usize::try_from(record.size)
        .ok()
        .filter(|size| *size <= plain.len())
        .ok_or_else(|| {
            TitlegenError::CodecError(format!(
                "content {:08x} is shorter than its recorded size {}",
                record.content_id, record.size
            ))
        })?;
    plain.truncate(size);

    if sha1(&plain) != record.hash {
        return Err(TitlegenError::CodecError(format!(
            "content {:08x} digest mismatch",
            record.content_id
        )));
    }
    Ok(plain)
}

/// Walks the 64-byte-aligned sections after the header.
struct SectionCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> SectionCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: align(WAD_HEADER_LEN, SECTION_ALIGN),
        }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], TitlegenError> {
        let section = slice(self.bytes, self.offset, len, what)?;
        self.offset = align(self.offset + len, SECTION_ALIGN);
        Ok(section)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codec::ticket::tests::{sample_ticket_bytes, COMMON_KEY};
    use crate::codec::tmd::tests::{sample_record, sample_tmd_bytes};

    const TITLE_KEY: AesKey = [0x24; 16];

    /// A two-content package for the given title.
    pub(crate) fn sample_wad(title_id: u64, version: u16) -> Wad {
        let mut tmd =
            Tmd::parse(&sample_tmd_bytes(title_id, &[sample_record(0, 0), sample_record(1, 1)]))
                .unwrap();
        tmd.title_version = version;
        let mut ticket = Ticket::parse(&sample_ticket_bytes(title_id, 0xabcd)).unwrap();
        ticket.title_version = version;
        ticket.set_title_key(&TITLE_KEY, &COMMON_KEY);

        let mut wad = Wad::new(tmd, ticket, b"CERTS".repeat(100));
        wad.set_content(0, b"first content blob", &TITLE_KEY).unwrap();
        wad.set_content(1, &[0x99; 100], &TITLE_KEY).unwrap();
        wad
    }

    #[test]
    fn test_wad_serialize_parse() {
        let wad = sample_wad(0x0001_0001_dead_beef, 3);
        let bytes = wad.to_bytes();

        assert_eq!(be_u32(&bytes, 0), WAD_HEADER_LEN as u32);
        assert_eq!(&bytes[4..6], b"Is");

        let parsed = Wad::parse(&bytes).unwrap();
        assert_eq!(parsed, wad);
    }

    #[test]
    fn test_set_content_backfills_record() {
        let wad = sample_wad(1, 0);
        assert_eq!(wad.tmd.contents[0].size, 18);
        assert_eq!(wad.tmd.contents[0].hash, sha1(b"first content blob"));
        assert_eq!(wad.contents[0].len(), 32);
        assert_eq!(wad.contents[1].len(), 112);
    }

    #[test]
    fn test_decrypt_content_roundtrip() {
        let wad = sample_wad(1, 0);
        let key = wad.ticket.title_key(&COMMON_KEY).unwrap();
        assert_eq!(wad.decrypt_content(0, &key).unwrap(), b"first content blob");
        assert_eq!(wad.decrypt_content(1, &key).unwrap(), vec![0x99; 100]);
    }

    #[test]
    fn test_decrypt_content_detects_corruption() {
        let mut wad = sample_wad(1, 0);
        wad.contents[0][0] ^= 0xff;
        assert!(matches!(
            wad.decrypt_content(0, &TITLE_KEY),
            Err(TitlegenError::CodecError(_))
        ));
    }

    #[test]
    fn test_set_content_out_of_range() {
        let mut wad = sample_wad(1, 0);
        assert!(wad.set_content(2, b"x", &TITLE_KEY).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        let mut bytes = sample_wad(1, 0).to_bytes();
        bytes[4] = b'X';
        assert!(matches!(
            Wad::parse(&bytes),
            Err(TitlegenError::CodecError(_))
        ));
        assert!(Wad::parse(&bytes[..0x10]).is_err());
    }

    #[test]
    fn test_parse_rejects_truncated_data() {
        let bytes = sample_wad(1, 0).to_bytes();
        assert!(Wad::parse(&bytes[..bytes.len() - 64]).is_err());
    }

    #[test]
    fn test_parse_rejects_mismatched_titles() {
        let mut wad = sample_wad(1, 0);
        wad.ticket.title_id = 2;
        assert!(matches!(
            Wad::parse(&wad.to_bytes()),
            Err(TitlegenError::CodecError(_))
        ));
    }
}
