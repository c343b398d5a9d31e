/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{metadata::OverlayCategoryName, rom_address::RomAddress};

/// Identifies the segment a section (or symbol) belongs to.
///
/// Vram values may overlap between overlays, so the owning segment is keyed
/// by the rom address where the segment starts plus the overlay category it
/// was loaded into, if any.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParentSegmentInfo {
    segment_rom: RomAddress,
    overlay_category_name: Option<OverlayCategoryName>,
}
impl ParentSegmentInfo {
    pub const fn new(
        segment_rom: RomAddress,
        overlay_category_name: Option<OverlayCategoryName>,
    ) -> Self {
        Self {
            segment_rom,
            overlay_category_name,
        }
    }

    pub const fn segment_rom(&self) -> RomAddress {
        self.segment_rom
    }
    pub const fn overlay_category_name(&self) -> Option<&OverlayCategoryName> {
        self.overlay_category_name.as_ref()
    }
}
