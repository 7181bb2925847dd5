//! Three-letter title codes packed into the low 24 bits of a title ID.
//!
//! SD titles live under `00010008-53xxxxxx`: the high word is the title
//! type, `0x53` is `S`, and the remaining three bytes are an uppercase code
//! derived from the application's ordinal.

use serde::Deserialize;

/// Namespace prefix for SD titles (`00010008-53000000`).
pub const SD_NAMESPACE: u64 = 0x0001_0008_5300_0000;

/// Number of distinct three-letter codes.
pub const CODE_SPACE: u32 = 26 * 26 * 26;

/// How an application ordinal becomes a three-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrdinalEncoding {
    /// Base-26 over `A..=Z`, most significant letter first; 0 is `AAA`.
    #[default]
    Alphabetic,
    /// Every ordinal maps to `AAA`.
    Placeholder,
}

impl OrdinalEncoding {
    /// Encode an ordinal, or `None` if it does not fit in three letters.
    pub fn encode(self, ordinal: u32) -> Option<[u8; 3]> {
        match self {
            OrdinalEncoding::Placeholder => Some(*b"AAA"),
            OrdinalEncoding::Alphabetic => {
                if ordinal >= CODE_SPACE {
                    return None;
                }
                let letter = |n: u32| b'A' + (n % 26) as u8;
                Some([letter(ordinal / 676), letter(ordinal / 26), letter(ordinal)])
            }
        }
    }
}

/// Pack a three-letter code into the low 24 bits.
pub fn pack_code(code: [u8; 3]) -> u64 {
    (u64::from(code[0]) << 16) | (u64::from(code[1]) << 8) | u64::from(code[2])
}
