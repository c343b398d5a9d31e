/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::fmt;
use core::fmt::Write;

use rabbitizer::Vram;

use crate::{
    address_range::AddressRange,
    context::{Context, OwnedSegmentNotFoundError},
    metadata::{segment_metadata::FindSettings, GeneratedBy, SymbolMetadata},
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    symbols::display::{SymBssDisplay, SymDisplaySettings},
};

use super::Symbol;

/// A span of an uninitialized-data section. It has no backing words, only a
/// vram range.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SymbolBss {
    vram_range: AddressRange<Vram>,
    in_file_offset: usize,
    parent_segment_info: ParentSegmentInfo,
}

impl SymbolBss {
    pub(crate) fn new(
        context: &mut Context,
        vram_range: AddressRange<Vram>,
        in_file_offset: usize,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<Self, OwnedSegmentNotFoundError> {
        {
            let owned_segment = context.find_owned_segment_mut(&parent_segment_info)?;
            let metadata = owned_segment.add_symbol(
                vram_range.start(),
                None,
                GeneratedBy::Autogenerated,
                Some(SectionType::Bss),
                false,
            );
            metadata.set_defined();
            metadata.set_autodetected_size(vram_range.size());
        }

        Ok(Self {
            vram_range,
            in_file_offset,
            parent_segment_info,
        })
    }

    pub const fn in_file_offset(&self) -> usize {
        self.in_file_offset
    }

    pub(crate) fn find_own_metadata<'ctx>(
        &self,
        context: &'ctx Context,
    ) -> Option<&'ctx SymbolMetadata> {
        let owned_segment = context.find_owned_segment(&self.parent_segment_info).ok()?;
        owned_segment.find_symbol(
            self.vram_range.start(),
            FindSettings::new().with_allow_addend(false),
        )
    }

    #[must_use]
    pub fn display<'ctx, 'sym, 'flg>(
        &'sym self,
        context: &'ctx Context,
        settings: &'flg SymDisplaySettings,
    ) -> SymBssDisplay<'ctx, 'sym, 'flg> {
        SymBssDisplay::new(context, self, settings)
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

impl Symbol for SymbolBss {
    fn vram_range(&self) -> &AddressRange<Vram> {
        &self.vram_range
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    fn section_type(&self) -> SectionType {
        SectionType::Bss
    }
}
