/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::{collections::btree_map::BTreeMap, string::String, vec::Vec};
use core::{error, fmt};

use rabbitizer::Vram;

use crate::{
    address_range::AddressRange,
    config::GlobalConfig,
    metadata::{
        segment_metadata::FindSettings, GeneratedBy, OverlayCategoryName, SegmentMetadata,
        SymbolMetadata,
    },
    parent_segment_info::ParentSegmentInfo,
    rom_address::RomAddress,
    sections::{
        SectionBss, SectionBssSettings, SectionCreationError, SectionData, SectionDataSettings,
        SectionRodata,
    },
};

/// Every segment of an overlay category, plus a placeholder spanning all of
/// them which is used when a reference can't be pinned to a specific overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayCategory {
    placeholder_segment: SegmentMetadata,
    segments: BTreeMap<RomAddress, SegmentMetadata>,
}

impl OverlayCategory {
    pub(crate) fn new(
        placeholder_segment: SegmentMetadata,
        segments: BTreeMap<RomAddress, SegmentMetadata>,
    ) -> Self {
        Self {
            placeholder_segment,
            segments,
        }
    }

    pub fn placeholder_segment(&self) -> &SegmentMetadata {
        &self.placeholder_segment
    }
    pub fn segments(&self) -> &BTreeMap<RomAddress, SegmentMetadata> {
        &self.segments
    }
}

/// The process-wide symbol store.
///
/// Every section analysis reads and writes the same Context, which is how a
/// pointer found in one section becomes a symbol in another. It outlives all
/// sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    global_config: GlobalConfig,

    global_segment: SegmentMetadata,
    /// Addresses nothing claims still need somewhere to live, mainly
    /// jumptable labels computed from garbage words.
    unknown_segment: SegmentMetadata,

    overlay_segments: BTreeMap<OverlayCategoryName, OverlayCategory>,
}

impl Context {
    pub(crate) fn new(
        global_config: GlobalConfig,
        global_segment: SegmentMetadata,
        overlay_segments: BTreeMap<OverlayCategoryName, OverlayCategory>,
    ) -> Self {
        Self {
            global_config,
            global_segment,
            unknown_segment: SegmentMetadata::new_unknown_segment(),
            overlay_segments,
        }
    }
}

impl Context {
    #[must_use]
    pub const fn global_config(&self) -> &GlobalConfig {
        &self.global_config
    }
    #[must_use]
    pub const fn global_segment(&self) -> &SegmentMetadata {
        &self.global_segment
    }
    #[must_use]
    pub const fn unknown_segment(&self) -> &SegmentMetadata {
        &self.unknown_segment
    }
    #[must_use]
    pub const fn overlay_segments(&self) -> &BTreeMap<OverlayCategoryName, OverlayCategory> {
        &self.overlay_segments
    }
}

impl Context {
    pub fn create_section_data(
        &mut self,
        settings: &SectionDataSettings,
        name: String,
        raw_bytes: &[u8],
        rom: RomAddress,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<SectionData, SectionCreationError> {
        SectionData::new(
            self,
            settings,
            name,
            raw_bytes,
            rom,
            vram,
            parent_segment_info,
        )
    }

    pub fn create_section_rodata(
        &mut self,
        settings: &SectionDataSettings,
        name: String,
        raw_bytes: &[u8],
        rom: RomAddress,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<SectionRodata, SectionCreationError> {
        SectionRodata::new(
            self,
            settings,
            name,
            raw_bytes,
            rom,
            vram,
            parent_segment_info,
        )
    }

    pub fn create_section_bss(
        &mut self,
        settings: &SectionBssSettings,
        name: String,
        vram_range: AddressRange<Vram>,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<SectionBss, SectionCreationError> {
        SectionBss::new(self, settings, name, vram_range, parent_segment_info)
    }
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub struct OwnedSegmentNotFoundError {}
impl fmt::Display for OwnedSegmentNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Can't find segment")
    }
}
impl error::Error for OwnedSegmentNotFoundError {}
impl From<OwnedSegmentNotFoundError> for fmt::Error {
    fn from(_value: OwnedSegmentNotFoundError) -> Self {
        Self {}
    }
}

/// Points at one of the segments a [`Context`] owns without borrowing it,
/// so a single traversal backs both the shared and the mutable accessors.
#[derive(Debug, Clone, PartialEq)]
enum SegmentSlot {
    Global,
    /// The overlay segment a `ParentSegmentInfo` itself describes.
    OwnedOverlay,
    /// The placeholder spanning a whole overlay category.
    Placeholder(OverlayCategoryName),
    Unknown,
}

impl Context {
    fn owned_segment_slot(
        &self,
        info: &ParentSegmentInfo,
    ) -> Result<SegmentSlot, OwnedSegmentNotFoundError> {
        if let Some(overlay_category_name) = info.overlay_category_name() {
            if let Some(category) = self.overlay_segments.get(overlay_category_name) {
                if let Some(segment) = category.segments.get(&info.segment_rom()) {
                    debug_assert!(segment.category_name() == Some(overlay_category_name));
                    debug_assert!(segment.rom_range().start() == info.segment_rom());
                    return Ok(SegmentSlot::OwnedOverlay);
                }
            }
        } else if self.global_segment.in_rom_range(info.segment_rom()) {
            // One global segment can back several file-level segments, so a
            // rom range check is all the validation there is.
            return Ok(SegmentSlot::Global);
        }
        Err(OwnedSegmentNotFoundError {})
    }

    /// Where a referenced vram is expected to be defined, as seen from the
    /// segment described by `info`: the global segment wins, then the
    /// overlay segment `info` names, then the placeholder of every other
    /// category. Addresses nobody claims fall through to the unknown
    /// segment.
    fn referenced_segment_slot(&self, vram: Vram, info: &ParentSegmentInfo) -> SegmentSlot {
        if self.global_segment.in_vram_range(vram) {
            return SegmentSlot::Global;
        }

        if let Some(overlay_category_name) = info.overlay_category_name() {
            if let Some(category) = self.overlay_segments.get(overlay_category_name) {
                if let Some(segment) = category.segments.get(&info.segment_rom()) {
                    if segment.in_vram_range(vram) {
                        return SegmentSlot::OwnedOverlay;
                    }
                }
            }
        }

        for (category_name, category) in self.overlay_segments.iter() {
            if info.overlay_category_name() == Some(category_name) {
                continue;
            }
            if category.placeholder_segment.in_vram_range(vram) {
                return SegmentSlot::Placeholder(category_name.clone());
            }
        }

        SegmentSlot::Unknown
    }

    // A slot is only ever built right after seeing the segment it points at,
    // with no mutation in between, so resolving it can't fail.
    fn resolve_slot(&self, slot: &SegmentSlot, info: &ParentSegmentInfo) -> &SegmentMetadata {
        match slot {
            SegmentSlot::Global => &self.global_segment,
            SegmentSlot::OwnedOverlay => {
                let category = info
                    .overlay_category_name()
                    .and_then(|name| self.overlay_segments.get(name))
                    .expect("A located slot resolves to an existing category");
                category
                    .segments
                    .get(&info.segment_rom())
                    .expect("A located slot resolves to an existing segment")
            }
            SegmentSlot::Placeholder(category_name) => {
                let category = self
                    .overlay_segments
                    .get(category_name)
                    .expect("A located slot resolves to an existing category");
                &category.placeholder_segment
            }
            SegmentSlot::Unknown => &self.unknown_segment,
        }
    }

    fn resolve_slot_mut(
        &mut self,
        slot: &SegmentSlot,
        info: &ParentSegmentInfo,
    ) -> &mut SegmentMetadata {
        match slot {
            SegmentSlot::Global => &mut self.global_segment,
            SegmentSlot::OwnedOverlay => {
                let category = info
                    .overlay_category_name()
                    .and_then(|name| self.overlay_segments.get_mut(name))
                    .expect("A located slot resolves to an existing category");
                category
                    .segments
                    .get_mut(&info.segment_rom())
                    .expect("A located slot resolves to an existing segment")
            }
            SegmentSlot::Placeholder(category_name) => {
                let category = self
                    .overlay_segments
                    .get_mut(category_name)
                    .expect("A located slot resolves to an existing category");
                &mut category.placeholder_segment
            }
            SegmentSlot::Unknown => &mut self.unknown_segment,
        }
    }
}

impl Context {
    pub(crate) fn find_owned_segment(
        &self,
        info: &ParentSegmentInfo,
    ) -> Result<&SegmentMetadata, OwnedSegmentNotFoundError> {
        let slot = self.owned_segment_slot(info)?;
        Ok(self.resolve_slot(&slot, info))
    }
    pub(crate) fn find_owned_segment_mut(
        &mut self,
        info: &ParentSegmentInfo,
    ) -> Result<&mut SegmentMetadata, OwnedSegmentNotFoundError> {
        let slot = self.owned_segment_slot(info)?;
        Ok(self.resolve_slot_mut(&slot, info))
    }

    /// The segment a referenced vram should be defined on, or `None` when no
    /// known segment claims the address.
    #[must_use]
    pub(crate) fn find_referenced_segment(
        &self,
        vram: Vram,
        info: &ParentSegmentInfo,
    ) -> Option<&SegmentMetadata> {
        match self.referenced_segment_slot(vram, info) {
            SegmentSlot::Unknown => None,
            slot => Some(self.resolve_slot(&slot, info)),
        }
    }

    #[must_use]
    pub(crate) fn find_referenced_segment_mut(
        &mut self,
        vram: Vram,
        info: &ParentSegmentInfo,
    ) -> Option<&mut SegmentMetadata> {
        match self.referenced_segment_slot(vram, info) {
            SegmentSlot::Unknown => None,
            slot => Some(self.resolve_slot_mut(&slot, info)),
        }
    }

    /// Like [`Context::find_referenced_segment_mut`], except unclaimed
    /// addresses resolve to the unknown segment instead of failing.
    fn segment_for_vram_mut(
        &mut self,
        vram: Vram,
        info: &ParentSegmentInfo,
    ) -> &mut SegmentMetadata {
        let slot = self.referenced_segment_slot(vram, info);
        self.resolve_slot_mut(&slot, info)
    }

    /// Look up a symbol on whichever segment should own `vram`, falling back
    /// to the unknown segment.
    #[must_use]
    pub(crate) fn find_symbol_from_any_segment(
        &self,
        vram: Vram,
        info: &ParentSegmentInfo,
        settings: FindSettings,
    ) -> Option<&SymbolMetadata> {
        if let Some(segment) = self.find_referenced_segment(vram, info) {
            if let Some(sym) = segment.find_symbol(vram, settings) {
                return Some(sym);
            }
        }

        self.unknown_segment.find_symbol(vram, settings)
    }

    /// Queue `vram` so the section owning it promotes it to a symbol on its
    /// next analysis.
    pub(crate) fn add_pointer_in_data_reference(&mut self, vram: Vram, info: &ParentSegmentInfo) {
        if let Some(segment) = self.find_referenced_segment_mut(vram, info) {
            segment.add_pointer_in_data(vram);
        }
    }

    /// Register a jumptable label, no matter which segment the address ends
    /// up on. Labels pointing outside every known segment land on the
    /// unknown segment and get flagged as such.
    pub fn add_jumptable_label(
        &mut self,
        vram: Vram,
        info: &ParentSegmentInfo,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        let segment = self.segment_for_vram_mut(vram, info);
        segment.add_jumptable_label(vram, None, generated_by)
    }

    /// All the symbols every known segment holds, for diagnostics.
    pub fn symbol_count(&self) -> usize {
        let mut count = self.global_segment.symbols().len() + self.unknown_segment.symbols().len();
        for category in self.overlay_segments.values() {
            count += category.placeholder_segment.symbols().len();
            for segment in category.segments.values() {
                count += segment.symbols().len();
            }
        }
        count
    }

    /// Vram values queued as pending pointer discoveries, for diagnostics.
    pub fn pending_pointers_in_data(&self) -> Vec<Vram> {
        let mut pending: Vec<Vram> = Vec::new();
        pending.extend(self.global_segment.pending_pointers_in_data());
        for category in self.overlay_segments.values() {
            for segment in category.segments.values() {
                pending.extend(segment.pending_pointers_in_data());
            }
        }
        pending
    }
}
