/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::{
    collections::btree_map::{self, BTreeMap},
    string::String,
    vec::Vec,
};
use core::{error, fmt};

use rabbitizer::Vram;

use crate::{
    config::GlobalConfig,
    metadata::{GeneratedBy, OverlayCategoryName, SegmentMetadata, SymbolMetadata},
    rom_address::RomAddress,
    rom_vram_range::RomVramRange,
    size::Size,
};

use super::{the_context::OverlayCategory, Context};

/// Lets the driver seed user-declared symbols on a segment before any
/// analysis runs.
pub struct SegmentModifier<'seg> {
    segment: &'seg mut SegmentMetadata,
}

impl SegmentModifier<'_> {
    pub fn add_symbol(
        &mut self,
        name: String,
        vram: Vram,
        rom: Option<RomAddress>,
    ) -> &mut SymbolMetadata {
        let sym = self
            .segment
            .add_symbol(vram, rom, GeneratedBy::UserDeclared, None, false);
        *sym.user_declared_name_mut() = Some(name);
        sym
    }

    pub fn add_symbol_with_size(
        &mut self,
        name: String,
        vram: Vram,
        rom: Option<RomAddress>,
        size: Size,
    ) -> &mut SymbolMetadata {
        let sym = self.add_symbol(name, vram, rom);
        *sym.user_declared_size_mut() = Some(size);
        sym
    }

    pub fn add_function(
        &mut self,
        name: String,
        vram: Vram,
        rom: Option<RomAddress>,
    ) -> &mut SymbolMetadata {
        let sym = self
            .segment
            .add_function(vram, rom, GeneratedBy::UserDeclared);
        *sym.user_declared_name_mut() = Some(name);
        sym
    }

    pub fn add_jumptable(
        &mut self,
        name: String,
        vram: Vram,
        rom: Option<RomAddress>,
    ) -> &mut SymbolMetadata {
        let sym = self
            .segment
            .add_jumptable(vram, rom, GeneratedBy::UserDeclared);
        *sym.user_declared_name_mut() = Some(name);
        sym
    }

    pub fn add_jumptable_label(
        &mut self,
        name: String,
        vram: Vram,
        rom: Option<RomAddress>,
    ) -> &mut SymbolMetadata {
        let sym = self
            .segment
            .add_jumptable_label(vram, rom, GeneratedBy::UserDeclared);
        *sym.user_declared_name_mut() = Some(name);
        sym
    }
}

/// First stage of building a [`Context`]: describe the global segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextBuilder {
    global_config: GlobalConfig,

    global_segment: SegmentMetadata,
}

impl ContextBuilder {
    #[must_use]
    pub fn new(global_config: GlobalConfig, global_ranges: RomVramRange) -> Self {
        let global_segment = SegmentMetadata::new(global_ranges, None);

        Self {
            global_config,
            global_segment,
        }
    }

    #[must_use]
    pub fn global_segment(&mut self) -> SegmentModifier {
        SegmentModifier {
            segment: &mut self.global_segment,
        }
    }

    #[must_use]
    pub fn process(self) -> ContextBuilderOverlay {
        ContextBuilderOverlay {
            global_config: self.global_config,
            global_segment: self.global_segment,
            overlay_segments: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub struct EmptyOverlayCategoryError {}
impl fmt::Display for EmptyOverlayCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "An overlay category requires at least one overlay segment")
    }
}
impl error::Error for EmptyOverlayCategoryError {}

pub struct OverlaysBuilder<'ctx> {
    name: OverlayCategoryName,
    entry: btree_map::Entry<'ctx, OverlayCategoryName, OverlayCategory>,
    overlays: Vec<SegmentMetadata>,
}

impl OverlaysBuilder<'_> {
    #[must_use]
    pub fn add_overlay(&mut self, ranges: RomVramRange) -> SegmentModifier {
        self.overlays
            .push(SegmentMetadata::new(ranges, Some(self.name.clone())));
        SegmentModifier {
            segment: self
                .overlays
                .last_mut()
                .expect("This shouldn't panic since we just added an element"),
        }
    }

    pub fn build(self) -> Result<(), EmptyOverlayCategoryError> {
        if self.overlays.is_empty() {
            return Err(EmptyOverlayCategoryError {});
        }

        let mut segments = BTreeMap::new();

        let mut ranges = *self.overlays[0].rom_vram_range();

        for seg in self.overlays {
            ranges.expand_ranges(seg.rom_vram_range());
            segments.insert(seg.rom_range().start(), seg);
        }

        let placeholder_segment = SegmentMetadata::new(ranges, Some(self.name));
        self.entry
            .or_insert(OverlayCategory::new(placeholder_segment, segments));
        Ok(())
    }
}

/// Second stage: register overlay categories, then build the [`Context`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextBuilderOverlay {
    global_config: GlobalConfig,

    global_segment: SegmentMetadata,
    overlay_segments: BTreeMap<OverlayCategoryName, OverlayCategory>,
}

impl ContextBuilderOverlay {
    #[must_use]
    pub fn add_overlay_category(&mut self, category: OverlayCategoryName) -> OverlaysBuilder {
        OverlaysBuilder {
            name: category.clone(),
            entry: self.overlay_segments.entry(category),
            overlays: Vec::new(),
        }
    }

    #[must_use]
    pub fn build(self) -> Context {
        Context::new(
            self.global_config,
            self.global_segment,
            self.overlay_segments,
        )
    }
}
