/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::{error, fmt};

use rabbitizer::Vram;

use crate::{context::OwnedSegmentNotFoundError, rom_address::RomAddress};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum SectionCreationError {
    OwnedSegmentNotFound(OwnedSegmentNotFoundError),
    RomVramAlignmentMismatch {
        name: String,
        rom: RomAddress,
        vram: Vram,
        multiple_of: u32,
    },
}

impl fmt::Display for SectionCreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionCreationError::OwnedSegmentNotFound(e) => write!(f, "{}", e),
            SectionCreationError::RomVramAlignmentMismatch {
                name,
                rom,
                vram,
                multiple_of,
            } => {
                write!(
                    f,
                    "Section '{}' has a rom address (0x{:X}) which is not aligned to its vram (0x{:08X}) modulo {}",
                    name,
                    rom.inner(),
                    vram.inner(),
                    multiple_of,
                )
            }
        }
    }
}
impl error::Error for SectionCreationError {}

impl From<OwnedSegmentNotFoundError> for SectionCreationError {
    fn from(value: OwnedSegmentNotFoundError) -> Self {
        SectionCreationError::OwnedSegmentNotFound(value)
    }
}
