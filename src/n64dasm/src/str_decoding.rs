/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::{borrow::Cow, string::String, vec::Vec};
use core::{error, fmt};

use crate::section_type::SectionType;

/// Text encoding used to validate and decode C strings found in data.
///
/// N64-era games overwhelmingly use either plain ASCII or EUC-JP, with
/// Shift JIS showing up on some Japanese releases.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Encoding {
    Ascii,
    EucJp,
    ShiftJis,
}

impl Encoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ASCII" => Some(Encoding::Ascii),
            "EUC-JP" => Some(Encoding::EucJp),
            "Shift-JIS" => Some(Encoding::ShiftJis),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ASCII",
            Encoding::EucJp => "EUC-JP",
            Encoding::ShiftJis => "Shift-JIS",
        }
    }

    /// Rodata defaults to EUC-JP since that's where compilers place string
    /// literals; every other section kind assumes ASCII.
    pub const fn default_for_section(section_type: SectionType) -> Self {
        match section_type {
            SectionType::Rodata => Encoding::EucJp,
            _ => Encoding::Ascii,
        }
    }

    /// Check `bytes` starts with a '\0'-terminated, decodable string.
    ///
    /// Returns the raw size of the string, terminator included.
    pub fn check_valid(&self, bytes: &[u8]) -> Result<usize, StringDecodingError> {
        let nul = bytes
            .iter()
            .position(|x| *x == 0)
            .ok_or(StringDecodingError::NoNulTerminator)?;

        let decoded = self
            .decode(&bytes[..nul])
            .ok_or(StringDecodingError::MalformedSequence)?;

        for c in decoded.chars() {
            if c.is_control() && !matches!(c, '\x07'..='\x0D') {
                return Err(StringDecodingError::DisallowedControlChar(c));
            }
        }

        Ok(nul + 1)
    }

    /// Decode `bytes` (no terminator) into text, or `None` if the bytes are
    /// not valid for this encoding.
    pub fn decode<'bytes>(&self, bytes: &'bytes [u8]) -> Option<Cow<'bytes, str>> {
        match self {
            Encoding::Ascii => {
                if bytes.is_ascii() {
                    // Checked above, so this never actually fails.
                    core::str::from_utf8(bytes).ok().map(Cow::Borrowed)
                } else {
                    None
                }
            }
            Encoding::EucJp => encoding_rs::EUC_JP
                .decode_without_bom_handling_and_without_replacement(bytes),
            Encoding::ShiftJis => encoding_rs::SHIFT_JIS
                .decode_without_bom_handling_and_without_replacement(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum StringDecodingError {
    NoNulTerminator,
    MalformedSequence,
    DisallowedControlChar(char),
}

impl fmt::Display for StringDecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringDecodingError::NoNulTerminator => {
                write!(f, "The string is missing a '\\0' terminator")
            }
            StringDecodingError::MalformedSequence => {
                write!(f, "The bytes are not valid for the given encoding")
            }
            StringDecodingError::DisallowedControlChar(c) => {
                write!(f, "Control character 0x{:02X} can't appear on a string", *c as u32)
            }
        }
    }
}
impl error::Error for StringDecodingError {}

/// Escape a decoded string so it can be emitted inside a `.asciz` directive.
pub(crate) fn escape_string(val: &str) -> String {
    let mut escaped_buf = Vec::with_capacity(val.len());

    for b in val.bytes() {
        // The cases of this switch are sorted by ASCII order
        match b {
            0x07 => {
                // \a
                escaped_buf.push(b'\\');
                escaped_buf.push(b'a');
            }
            0x08 => {
                // \b
                escaped_buf.push(b'\\');
                escaped_buf.push(b'b');
            }
            b'\t' => {
                escaped_buf.push(b'\\');
                escaped_buf.push(b't');
            }
            b'\n' => {
                escaped_buf.push(b'\\');
                escaped_buf.push(b'n');
            }
            0x0B => {
                // \v
                escaped_buf.push(b'\\');
                escaped_buf.push(b'v');
            }
            0x0C => {
                // \f
                escaped_buf.push(b'\\');
                escaped_buf.push(b'f');
            }
            b'\r' => {
                escaped_buf.push(b'\\');
                escaped_buf.push(b'r');
            }
            b'\"' => {
                escaped_buf.push(b'\\');
                escaped_buf.push(b'"');
            }
            b'\\' => {
                escaped_buf.push(b'\\');
                escaped_buf.push(b'\\');
            }
            x => escaped_buf.push(x),
        }
    }

    String::from_utf8(escaped_buf).expect("Escaping can't break utf8 sequences")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_string_with_newline() {
        let bytes = b"first line\nsecond\0\0";

        assert_eq!(Encoding::Ascii.check_valid(bytes), Ok(18));
    }

    #[test]
    fn unterminated_string_is_rejected() {
        let bytes = b"no terminator here";

        assert_eq!(
            Encoding::Ascii.check_valid(bytes),
            Err(StringDecodingError::NoNulTerminator)
        );
    }

    #[test]
    fn euc_jp_sequence() {
        // "テスト" in EUC-JP
        let bytes = [0xA5, 0xC6, 0xA5, 0xB9, 0xA5, 0xC8, 0x00];

        assert_eq!(Encoding::EucJp.check_valid(&bytes), Ok(7));
        assert_eq!(Encoding::Ascii.check_valid(&bytes), Err(StringDecodingError::MalformedSequence));
    }

    #[test]
    fn truncated_multibyte_sequence_is_rejected() {
        let bytes = [0xA5, 0x00];

        assert_eq!(
            Encoding::EucJp.check_valid(&bytes),
            Err(StringDecodingError::MalformedSequence)
        );
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_string("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(escape_string("back\\slash"), "back\\\\slash");
    }
}
