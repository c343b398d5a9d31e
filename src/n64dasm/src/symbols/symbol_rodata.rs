/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::{string::String, vec::Vec};
use core::fmt;
use core::fmt::Write;

use rabbitizer::Vram;

use crate::{
    address_range::AddressRange,
    context::{Context, OwnedSegmentNotFoundError},
    parent_segment_info::ParentSegmentInfo,
    rom_address::RomAddress,
    rom_vram_range::RomVramRange,
    section_type::SectionType,
    size::Size,
    str_decoding::Encoding,
    symbols::display::{SymDataDisplay, SymDisplaySettings},
};

use super::{RomSymbol, Symbol, SymbolBase};

/// A span of a read-only data section associated with one symbol.
///
/// Rodata spans additionally know about jumptables, doubles and late rodata
/// since those drive the file boundary detection.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SymbolRodata {
    base: SymbolBase,
}

impl SymbolRodata {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        context: &mut Context,
        words: Vec<u32>,
        rom: RomAddress,
        vram: Vram,
        in_file_offset: usize,
        parent_segment_info: ParentSegmentInfo,
        section_type: SectionType,
        encoding: Encoding,
        comment_offset: Size,
    ) -> Result<Self, OwnedSegmentNotFoundError> {
        let base = SymbolBase::new(
            words,
            rom,
            vram,
            in_file_offset,
            parent_segment_info,
            section_type,
            encoding,
            comment_offset,
        );
        base.analyze(context)?;

        Ok(Self { base })
    }

    pub const fn symbol_base(&self) -> &SymbolBase {
        &self.base
    }
    pub fn words(&self) -> &[u32] {
        self.base.words()
    }
    pub const fn in_file_offset(&self) -> usize {
        self.base.in_file_offset()
    }

    pub(crate) fn set_comment_offset(&mut self, comment_offset: Size) {
        self.base.set_comment_offset(comment_offset);
    }

    pub fn is_jumptable(&self, context: &Context) -> bool {
        self.base.is_jumptable(context)
    }

    pub fn is_late_rodata(&self, context: &Context) -> bool {
        self.base.is_late_rodata(context)
    }

    pub fn is_double(&self, context: &Context, i: usize) -> bool {
        self.base.is_double(context, i)
    }

    pub fn count_extra_padding(&self, context: &Context) -> u32 {
        self.base.count_extra_padding(context)
    }

    #[must_use]
    pub fn display<'ctx, 'sym, 'flg>(
        &'sym self,
        context: &'ctx Context,
        settings: &'flg SymDisplaySettings,
    ) -> SymDataDisplay<'ctx, 'sym, 'flg> {
        SymDataDisplay::new(context, &self.base, settings)
    }

    pub fn disassemble(
        &self,
        context: &Context,
        settings: &SymDisplaySettings,
    ) -> Result<String, fmt::Error> {
        let mut output = String::new();
        write!(output, "{}", self.display(context, settings))?;
        Ok(output)
    }
}

impl Symbol for SymbolRodata {
    fn vram_range(&self) -> &AddressRange<Vram> {
        self.base.vram_range()
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        self.base.parent_segment_info()
    }

    fn section_type(&self) -> SectionType {
        self.base.section_type()
    }
}
impl RomSymbol for SymbolRodata {
    fn rom_vram_range(&self) -> &RomVramRange {
        self.base.rom_vram_range()
    }
}
