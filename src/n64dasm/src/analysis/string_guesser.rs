/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{
    metadata::{SymbolMetadata, SymbolType},
    str_decoding::Encoding,
};

/// Sets the level for the C string guesser. Smaller values mean more
/// conservative methods to guess a string, while higher values are more
/// aggressive. The first level ([`No`]) completely disables the guessing
/// feature.
///
/// A C string must start at a 0x4-aligned region, it must be '\\0'-terminated
/// and it must decode cleanly with the configured encoding. There's no way to
/// bypass those hard restrictions.
///
/// [`No`]: StringGuesserLevel::No
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum StringGuesserLevel {
    /// Completely disable the guessing feature.
    No,

    /// The most conservative guessing level. Imposes the following restrictions:
    /// - Do not try to guess if the user provided a type for the symbol.
    /// - Do not try to guess if type information for the symbol can be inferred by other means.
    /// - A string symbol must be referenced only once.
    /// - Strings must not be empty.
    Conservative,

    /// A string no longer needs to be referenced only once to be considered a string candidate.
    /// This may happen because of a deduplication optimization or by plain `data` strings.
    MultipleReferences,

    /// Allow empty strings. Likely to yield false positives.
    EmptyStrings,

    /// Symbols with autodetected type information but no user type information can still be
    /// guessed as strings.
    IgnoreDetectedType,

    /// (Almost) always try to guess if something is a string.
    ///
    /// Only avoids checking if something is a string if it has a user-declared type.
    Full,
}

impl StringGuesserLevel {
    pub const fn default() -> Self {
        StringGuesserLevel::MultipleReferences
    }

    /// Decide if the symbol at the start of `bytes` looks like a C string.
    #[must_use]
    pub fn guess_c_string(
        &self,
        metadata: &SymbolMetadata,
        bytes: &[u8],
        encoding: Encoding,
    ) -> bool {
        if metadata.is_maybe_string() || metadata.sym_type() == Some(SymbolType::CString) {
            return true;
        }
        if metadata.user_declared_type().is_some() {
            return false;
        }

        if *self <= Self::No {
            return false;
        }

        if bytes.is_empty() || metadata.vram().inner() % 4 != 0 {
            return false;
        }

        if metadata.reference_counter() > 1 && *self < Self::MultipleReferences {
            return false;
        }

        if bytes[0] == b'\0' {
            // Empty strings are pretty rare and unlikely.
            if *self < Self::EmptyStrings {
                return false;
            }
        }

        if metadata.autodetected_type().is_some() && *self < Self::IgnoreDetectedType {
            return false;
        }

        encoding.check_valid(bytes).is_ok()
    }

    /// Decide if the symbol at the start of `bytes` looks like a Pascal
    /// string: a length byte followed by that many printable characters.
    #[must_use]
    pub fn guess_pascal_string(&self, metadata: &SymbolMetadata, bytes: &[u8]) -> bool {
        if metadata.is_maybe_pascal_string() {
            return true;
        }
        if metadata.user_declared_type().is_some() {
            return false;
        }

        if *self <= Self::No {
            return false;
        }

        if metadata.autodetected_type().is_some() && *self < Self::IgnoreDetectedType {
            return false;
        }

        let len = match bytes.first() {
            Some(0) | None => return false,
            Some(len) => *len as usize,
        };
        if 1 + len > bytes.len() {
            return false;
        }

        bytes[1..1 + len]
            .iter()
            .all(|x| x.is_ascii_graphic() || *x == b' ')
    }
}

impl Default for StringGuesserLevel {
    fn default() -> Self {
        Self::default()
    }
}
