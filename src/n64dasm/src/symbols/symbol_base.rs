/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::vec::Vec;

use rabbitizer::Vram;

use crate::{
    address_range::AddressRange,
    context::{Context, OwnedSegmentNotFoundError},
    metadata::{segment_metadata::FindSettings, GeneratedBy, SymbolMetadata, SymbolType},
    parent_segment_info::ParentSegmentInfo,
    rom_address::RomAddress,
    rom_vram_range::RomVramRange,
    section_type::SectionType,
    size::Size,
    str_decoding::Encoding,
};

/// State common to every span produced by partitioning a section.
///
/// A span owns a copy of its words; it never reaches back into the section's
/// buffer, and it never mutates its own copy either.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolBase {
    ranges: RomVramRange,
    in_file_offset: usize,
    words: Vec<u32>,
    section_type: SectionType,
    encoding: Encoding,
    comment_offset: Size,
    parent_segment_info: ParentSegmentInfo,
}

impl SymbolBase {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        words: Vec<u32>,
        rom: RomAddress,
        vram: Vram,
        in_file_offset: usize,
        parent_segment_info: ParentSegmentInfo,
        section_type: SectionType,
        encoding: Encoding,
        comment_offset: Size,
    ) -> Self {
        let size = Size::new(words.len() as u32 * 4);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);
        let ranges = RomVramRange::new(rom_range, vram_range);

        Self {
            ranges,
            in_file_offset,
            words,
            section_type,
            encoding,
            comment_offset,
            parent_segment_info,
        }
    }

    pub const fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }
    pub const fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }
    pub fn vram(&self) -> Vram {
        self.ranges.vram().start()
    }
    pub fn rom(&self) -> RomAddress {
        self.ranges.rom().start()
    }

    pub const fn in_file_offset(&self) -> usize {
        self.in_file_offset
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }
    pub fn sizew(&self) -> usize {
        self.words.len()
    }

    pub const fn section_type(&self) -> SectionType {
        self.section_type
    }
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub const fn comment_offset(&self) -> Size {
        self.comment_offset
    }
    pub(crate) fn set_comment_offset(&mut self, comment_offset: Size) {
        self.comment_offset = comment_offset;
    }

    pub const fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }
}

impl SymbolBase {
    /// Settle the Context record backing this span: the symbol is now known
    /// to actually exist on a section, at a concrete rom address, with a
    /// concrete size.
    pub(crate) fn analyze(&self, context: &mut Context) -> Result<(), OwnedSegmentNotFoundError> {
        let owned_segment = context.find_owned_segment_mut(&self.parent_segment_info)?;

        let metadata = owned_segment.add_symbol(
            self.vram(),
            Some(self.rom()),
            GeneratedBy::Autogenerated,
            Some(self.section_type),
            false,
        );
        metadata.set_defined();
        metadata.set_autodetected_size(self.vram_range().size());

        Ok(())
    }

    pub(crate) fn find_own_metadata<'ctx>(&self, context: &'ctx Context) -> Option<&'ctx SymbolMetadata> {
        let owned_segment = context.find_owned_segment(&self.parent_segment_info).ok()?;
        owned_segment.find_symbol(self.vram(), FindSettings::new().with_allow_addend(false))
    }

    pub fn is_jumptable(&self, context: &Context) -> bool {
        self.find_own_metadata(context)
            .is_some_and(|metadata| metadata.is_jumptable())
    }

    pub fn is_late_rodata(&self, context: &Context) -> bool {
        self.find_own_metadata(context)
            .is_some_and(|metadata| metadata.is_late_rodata(context.global_config().compiler()))
    }

    /// Whether the word pair starting at index `i` encodes a double.
    pub fn is_double(&self, context: &Context, i: usize) -> bool {
        if i % 2 != 0 || i + 1 >= self.words.len() {
            return false;
        }
        self.find_own_metadata(context)
            .is_some_and(|metadata| metadata.sym_type() == Some(SymbolType::Float64))
    }

    /// How many trailing zero words this span carries beyond its actual
    /// content. Compilers produce them by aligning whatever comes next, so
    /// they hint at file splits.
    pub fn count_extra_padding(&self, context: &Context) -> u32 {
        let mut count = 0;
        let words = &self.words;

        let metadata = self.find_own_metadata(context);
        let sym_type = metadata.and_then(|x| x.sym_type());
        let is_string = sym_type == Some(SymbolType::CString)
            || (sym_type.is_none() && metadata.is_some_and(|x| x.is_maybe_string()));

        if is_string {
            for i in (1..words.len()).rev() {
                if words[i] != 0 {
                    break;
                }
                // The previous word must hold the string terminator for this
                // one to be pure padding.
                if (words[i - 1] & 0x000000FF) == 0 {
                    count += 1;
                } else {
                    break;
                }
            }
        } else if sym_type == Some(SymbolType::Float64) {
            let mut i = words.len();
            while i >= 4 {
                if words[i - 1] != 0 || words[i - 2] != 0 {
                    break;
                }
                count += 2;
                i -= 2;
            }
        } else {
            for i in (1..words.len()).rev() {
                if words[i] != 0 {
                    break;
                }
                count += 1;
            }
        }

        count
    }
}
