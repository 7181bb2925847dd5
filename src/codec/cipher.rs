//! AES-128-CBC and SHA-1 primitives used by the package formats.

use crate::TitlegenError;
use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha1::{Digest, Sha1};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES-128 key length in bytes.
pub const KEY_LEN: usize = 16;

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

/// An AES-128 key.
pub type AesKey = [u8; KEY_LEN];

/// Round `len` up to a multiple of `to`.
pub fn align(len: usize, to: usize) -> usize {
    len.div_ceil(to) * to
}

/// IV for content encryption: the content index, then zeros.
pub fn content_iv(index: u16) -> [u8; BLOCK_LEN] {
    let mut iv = [0u8; BLOCK_LEN];
    iv[..2].copy_from_slice(&index.to_be_bytes());
    iv
}

/// IV for title key wrapping: the title ID, then zeros.
pub fn title_key_iv(title_id: u64) -> [u8; BLOCK_LEN] {
    let mut iv = [0u8; BLOCK_LEN];
    iv[..8].copy_from_slice(&title_id.to_be_bytes());
    iv
}

/// Encrypt `data`, zero-padding it to the block size first.
pub fn encrypt_cbc(key: &AesKey, iv: &[u8; BLOCK_LEN], data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    padded.resize(align(data.len(), BLOCK_LEN), 0);
    Aes128CbcEnc::new(&(*key).into(), &(*iv).into())
        .encrypt_padded_vec_mut::<NoPadding>(&padded)
}

/// Decrypt block-aligned `data`. Padding is left in place.
pub fn decrypt_cbc(
    key: &AesKey,
    iv: &[u8; BLOCK_LEN],
    data: &[u8],
) -> Result<Vec<u8>, TitlegenError> {
    if data.len() % BLOCK_LEN != 0 {
        return Err(TitlegenError::CodecError(format!(
            "ciphertext length {} is not a multiple of {}",
            data.len(),
            BLOCK_LEN
        )));
    }
    Aes128CbcDec::new(&(*key).into(), &(*iv).into())
        .decrypt_padded_vec_mut::<NoPadding>(data)
        .map_err(|e| TitlegenError::CodecError(format!("decryption failed: {}", e)))
}

/// SHA-1 digest as stored in content records.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

/// Parse a 32-hex-character AES key.
pub fn parse_key_hex(hex_key: &str) -> Result<AesKey, TitlegenError> {
    let bytes = hex::decode(hex_key.trim())
        .map_err(|e| TitlegenError::ConfigError(format!("key is not valid hex: {}", e)))?;
    AesKey::try_from(bytes.as_slice()).map_err(|_| {
        TitlegenError::ConfigError(format!(
            "key must be {} bytes ({} hex characters), got {} bytes",
            KEY_LEN,
            KEY_LEN * 2,
            bytes.len()
        ))
    })
}
