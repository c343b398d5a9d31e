/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::vec::Vec;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "big" => Some(Endian::Big),
            "little" => Some(Endian::Little),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Endian::Big => "big",
            Endian::Little => "little",
        }
    }

    pub fn word_from_bytes(self, bytes: &[u8]) -> u32 {
        let x = bytes[..4].try_into().expect("Wrong input");

        match self {
            Endian::Big => u32::from_be_bytes(x),
            Endian::Little => u32::from_le_bytes(x),
        }
    }

    pub fn dword_from_bytes(self, bytes: &[u8]) -> u64 {
        let x = bytes[..8].try_into().expect("Wrong input");

        match self {
            Endian::Big => u64::from_be_bytes(x),
            Endian::Little => u64::from_le_bytes(x),
        }
    }

    /// Decode a byte image into words. Trailing bytes that don't make up a
    /// whole word are dropped.
    pub fn words_from_bytes(self, bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| self.word_from_bytes(chunk))
            .collect()
    }
}

/// Serialize words into the canonical big-endian byte image used for
/// hashing, string inspection and binary emission.
pub fn be_bytes_from_words(words: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for word in words {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_round_trip_through_be_bytes() {
        let words = [0x80000400, 0x0000_0001, 0xDEADBEEF];

        let bytes = be_bytes_from_words(&words);
        assert_eq!(Endian::Big.words_from_bytes(&bytes), words);
    }

    #[test]
    fn little_endian_decoding() {
        let bytes = [0x10, 0x32, 0x54, 0x76, 0xFF];

        assert_eq!(Endian::Little.words_from_bytes(&bytes), [0x76543210]);
        assert_eq!(Endian::Big.words_from_bytes(&bytes), [0x10325476]);
    }
}
