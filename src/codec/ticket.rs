//! Tickets: the license record of a title.
//!
//! Layout after the 0x140-byte signed blob header:
//! ```text
//! 0x1BF  encrypted title key  [u8; 16]
//! 0x1D0  ticket_id            u64
//! 0x1DC  title_id             u64
//! 0x1E6  title_version        u16
//! ```
//! The title key is wrapped with AES-128-CBC under the common key, using
//! the title ID as IV.

use crate::codec::cipher::{decrypt_cbc, encrypt_cbc, title_key_iv, AesKey, KEY_LEN};
use crate::codec::{be_u16, be_u64, put, slice};
use crate::TitlegenError;

/// Length of a ticket, signature included.
pub const TICKET_LEN: usize = 0x2A4;

const TITLE_KEY_OFFSET: usize = 0x1BF;
const TICKET_ID_OFFSET: usize = 0x1D0;
const TITLE_ID_OFFSET: usize = 0x1DC;
const TITLE_VERSION_OFFSET: usize = 0x1E6;

/// A parsed ticket.
#[derive(Debug, Clone)]
pub struct Ticket {
    raw: Vec<u8>,
    /// Title key, wrapped under the common key.
    pub encrypted_title_key: AesKey,
    /// License instance ID; zero marks a ticket that was never issued.
    pub ticket_id: u64,
    /// Title identity.
    pub title_id: u64,
    /// Title version.
    pub title_version: u16,
}

impl Ticket {
    /// Parse a ticket.
    pub fn parse(bytes: &[u8]) -> Result<Self, TitlegenError> {
        let raw = slice(bytes, 0, TICKET_LEN, "ticket")?;
        let mut encrypted_title_key = [0u8; KEY_LEN];
        encrypted_title_key.copy_from_slice(&raw[TITLE_KEY_OFFSET..TITLE_KEY_OFFSET + KEY_LEN]);

        Ok(Self {
            raw: raw.to_vec(),
            encrypted_title_key,
            ticket_id: be_u64(raw, TICKET_ID_OFFSET),
            title_id: be_u64(raw, TITLE_ID_OFFSET),
            title_version: be_u16(raw, TITLE_VERSION_OFFSET),
        })
    }

    /// Serialize, writing the edited fields back into the record.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.raw.clone();
        put(&mut out, TITLE_KEY_OFFSET, &self.encrypted_title_key);
        put(&mut out, TICKET_ID_OFFSET, &self.ticket_id.to_be_bytes());
        put(&mut out, TITLE_ID_OFFSET, &self.title_id.to_be_bytes());
        put(&mut out, TITLE_VERSION_OFFSET, &self.title_version.to_be_bytes());
        out
    }

    /// Unwrap the title key.
    pub fn title_key(&self, common_key: &AesKey) -> Result<AesKey, TitlegenError> {
        let plain = decrypt_cbc(
            common_key,
            &title_key_iv(self.title_id),
            &self.encrypted_title_key,
        )?;
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&plain);
        Ok(key)
    }

    /// Wrap and store a new title key.
    ///
    /// The IV is derived from `title_id`, so set the title ID first.
    pub fn set_title_key(&mut self, title_key: &AesKey, common_key: &AesKey) {
        let wrapped = encrypt_cbc(common_key, &title_key_iv(self.title_id), title_key);
        self.encrypted_title_key.copy_from_slice(&wrapped);
    }
}

impl PartialEq for Ticket {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Ticket {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const COMMON_KEY: AesKey = [0x5a; KEY_LEN];

    /// Build a ticket template carrying a non-zero ticket ID.
    pub(crate) fn sample_ticket_bytes(title_id: u64, ticket_id: u64) -> Vec<u8> {
        let mut raw = vec![0u8; TICKET_LEN];
        put(&mut raw, 0, &0x0001_0001u32.to_be_bytes());
        put(&mut raw, 0x140, b"Root-CA00000001-XS00000003");
        put(&mut raw, TICKET_ID_OFFSET, &ticket_id.to_be_bytes());
        put(&mut raw, TITLE_ID_OFFSET, &title_id.to_be_bytes());
        put(&mut raw, 0x222, &[0xff; 0x20]);
        raw
    }

    #[test]
    fn test_ticket_roundtrip() {
        let bytes = sample_ticket_bytes(0x0001_0001_dead_beef, 0x1122_3344);
        let ticket = Ticket::parse(&bytes).unwrap();

        assert_eq!(ticket.title_id, 0x0001_0001_dead_beef);
        assert_eq!(ticket.ticket_id, 0x1122_3344);
        assert_eq!(ticket.to_bytes(), bytes);
    }

    #[test]
    fn test_title_key_wrap_roundtrip() {
        let mut ticket = Ticket::parse(&sample_ticket_bytes(0x0001_0008_5341_4141, 1)).unwrap();
        let title_key = [0x13; KEY_LEN];

        ticket.set_title_key(&title_key, &COMMON_KEY);
        assert_ne!(ticket.encrypted_title_key, title_key);
        assert_eq!(ticket.title_key(&COMMON_KEY).unwrap(), title_key);

        // Wrapped key survives serialization.
        let reparsed = Ticket::parse(&ticket.to_bytes()).unwrap();
        assert_eq!(reparsed.title_key(&COMMON_KEY).unwrap(), title_key);
    }

    #[test]
    fn test_title_key_depends_on_title_id() {
        let mut a = Ticket::parse(&sample_ticket_bytes(1, 0)).unwrap();
        let mut b = Ticket::parse(&sample_ticket_bytes(2, 0)).unwrap();
        a.set_title_key(&[7; KEY_LEN], &COMMON_KEY);
        b.set_title_key(&[7; KEY_LEN], &COMMON_KEY);
        assert_ne!(a.encrypted_title_key, b.encrypted_title_key);
    }

    #[test]
    fn test_zeroed_ticket_id_only_changes_that_field() {
        let bytes = sample_ticket_bytes(0x0001_0001_dead_beef, 0xffff_ffff_ffff_ffff);
        let mut ticket = Ticket::parse(&bytes).unwrap();
        ticket.ticket_id = 0;

        let zeroed = ticket.to_bytes();
        for (offset, (before, after)) in bytes.iter().zip(&zeroed).enumerate() {
            let in_field = (TICKET_ID_OFFSET..TICKET_ID_OFFSET + 8).contains(&offset);
            if !in_field {
                assert_eq!(before, after, "byte {:#x} changed", offset);
            }
        }
        assert_eq!(be_u64(&zeroed, TICKET_ID_OFFSET), 0);
    }

    #[test]
    fn test_ticket_truncated() {
        let bytes = sample_ticket_bytes(1, 1);
        assert!(matches!(
            Ticket::parse(&bytes[..TICKET_LEN - 1]),
            Err(TitlegenError::CodecError(_))
        ));
    }
}
