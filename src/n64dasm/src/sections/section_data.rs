/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::{collections::btree_set::BTreeSet, string::String, vec::Vec};
use core::fmt;
use core::fmt::Write;

use rabbitizer::Vram;

use crate::{
    analysis::StringGuesserLevel,
    config::PolicyFlags,
    context::{Context, OwnedSegmentNotFoundError},
    metadata::{segment_metadata::FindSettings, GeneratedBy},
    parent_segment_info::ParentSegmentInfo,
    rom_address::RomAddress,
    section_type::SectionType,
    size::Size,
    str_decoding::Encoding,
    symbols::{display::SymDisplaySettings, SymbolData},
};

use super::{Section, SectionBase, SectionCreationError};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct SectionDataSettings {
    string_guesser_level: StringGuesserLevel,
    encoding: Option<Encoding>,
}

impl SectionDataSettings {
    pub fn new() -> Self {
        Self {
            string_guesser_level: StringGuesserLevel::default(),
            encoding: None,
        }
    }

    pub fn string_guesser_level(&self) -> StringGuesserLevel {
        self.string_guesser_level
    }
    pub fn with_string_guesser_level(self, string_guesser_level: StringGuesserLevel) -> Self {
        Self {
            string_guesser_level,
            ..self
        }
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }
    /// Override the encoding used for string guessing, instead of the
    /// default the section kind implies.
    pub fn with_encoding(self, encoding: Option<Encoding>) -> Self {
        Self { encoding, ..self }
    }
}

impl Default for SectionDataSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// An initialized-data section, partitioned into [`SymbolData`] spans by
/// `analyze`.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SectionData {
    base: SectionBase,

    settings: SectionDataSettings,

    data_symbols: Vec<SymbolData>,
}

impl SectionData {
    pub(crate) fn new(
        context: &mut Context,
        settings: &SectionDataSettings,
        name: String,
        raw_bytes: &[u8],
        rom: RomAddress,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<Self, SectionCreationError> {
        Self::new_with_type(
            context,
            settings,
            name,
            raw_bytes,
            rom,
            vram,
            parent_segment_info,
            SectionType::Data,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_with_type(
        context: &mut Context,
        settings: &SectionDataSettings,
        name: String,
        raw_bytes: &[u8],
        rom: RomAddress,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
        section_type: SectionType,
    ) -> Result<Self, SectionCreationError> {
        if (rom.inner() % 4) != (vram.inner() % 4) {
            return Err(SectionCreationError::RomVramAlignmentMismatch {
                name,
                rom,
                vram,
                multiple_of: 4,
            });
        }

        // Make sure the owning segment actually exists before any analysis
        // relies on it.
        context.find_owned_segment(&parent_segment_info)?;

        let endian = context.global_config().endian_for_section(section_type);
        let words = endian.words_from_bytes(raw_bytes);

        let encoding = settings
            .encoding
            .unwrap_or(Encoding::default_for_section(section_type));

        let base = SectionBase::new(
            name,
            words,
            rom,
            vram,
            section_type,
            parent_segment_info,
            encoding,
        );

        Ok(Self {
            base,
            settings: *settings,
            data_symbols: Vec::new(),
        })
    }

    pub fn data_symbols(&self) -> &[SymbolData] {
        &self.data_symbols
    }

    pub fn settings(&self) -> &SectionDataSettings {
        &self.settings
    }

    pub fn set_comment_offset(&mut self, comment_offset: Size) {
        self.base.set_comment_offset(comment_offset);
        for sym in self.data_symbols.iter_mut() {
            sym.set_comment_offset(comment_offset);
        }
    }
}

impl SectionData {
    /// Partition the section into symbol spans, creating Context symbols for
    /// newly discovered pointer targets.
    ///
    /// The first pass walks the words matching them against the Context and
    /// the pending pointers-in-data queue. Words holding a pointer to an
    /// earlier offset of this same section flag a second, backfill pass,
    /// since the target offset was already walked by the time the pointer
    /// got queued.
    ///
    /// Running this again over the same Context reaches a fixpoint: the span
    /// list is rebuilt from scratch and symbol creation is idempotent.
    pub fn analyze(&mut self, context: &mut Context) -> Result<(), OwnedSegmentNotFoundError> {
        self.data_symbols.clear();
        self.base.reset_analysis_state();
        self.base.check_and_create_first_symbol(context)?;

        let section_bytes = self.base.be_bytes();
        let create_pads = context
            .global_config()
            .policy()
            .contains(PolicyFlags::CREATE_DATA_PADS);

        let mut symbol_list: Vec<(usize, Vram)> = Vec::new();
        let mut offsets_with_symbols: BTreeSet<usize> = BTreeSet::new();

        let mut needs_further_analysis = false;

        for i in 0..self.base.sizew() {
            let local_offset = i * 4;
            let word = self.base.words()[i];
            let current_vram = self.base.vram_offset(local_offset);
            let current_rom = self.base.rom_offset(local_offset);

            let exact_match = {
                let owned_segment = context.find_owned_segment(self.base.parent_segment_info())?;
                owned_segment
                    .find_symbol(current_vram, FindSettings::new().with_allow_addend(false))
                    .map(|metadata| (metadata.has_user_declared_size(), metadata.size()))
            };

            if let Some((has_user_declared_size, declared_size)) = exact_match {
                symbol_list.push((local_offset, current_vram));
                offsets_with_symbols.insert(local_offset);
                self.guess_string_types(context, current_vram, &section_bytes[local_offset..])?;

                if create_pads && has_user_declared_size {
                    self.create_pad_from_declared_size(
                        context,
                        current_vram,
                        local_offset,
                        declared_size,
                    )?;
                }
            } else if self
                .base
                .pop_pointer_in_data_reference(context, current_vram)
                .is_some()
            {
                let owned_segment = context.find_owned_segment_mut(self.base.parent_segment_info())?;
                owned_segment.add_symbol(
                    current_vram,
                    Some(current_rom),
                    GeneratedBy::Autogenerated,
                    Some(self.base.section_type()),
                    false,
                );

                self.guess_string_types(context, current_vram, &section_bytes[local_offset..])?;
                symbol_list.push((local_offset, current_vram));
                offsets_with_symbols.insert(local_offset);
            }

            if self
                .base
                .check_word_is_a_symbol_reference(context, current_rom, word)
            {
                let word_vram = Vram::new(word);
                if word_vram < current_vram && self.base.contains_vram(word_vram) {
                    // References a symbol from this same section, behind this
                    // offset. It was queued too late for this pass to see it.
                    needs_further_analysis = true;
                }
            }
        }

        if needs_further_analysis {
            for i in 0..self.base.sizew() {
                let local_offset = i * 4;
                let current_vram = self.base.vram_offset(local_offset);
                let current_rom = self.base.rom_offset(local_offset);

                if self
                    .base
                    .pop_pointer_in_data_reference(context, current_vram)
                    .is_some()
                    && !offsets_with_symbols.contains(&local_offset)
                {
                    {
                        let owned_segment =
                            context.find_owned_segment_mut(self.base.parent_segment_info())?;
                        let metadata = owned_segment.add_symbol(
                            current_vram,
                            Some(current_rom),
                            GeneratedBy::Autogenerated,
                            Some(self.base.section_type()),
                            true,
                        );
                        metadata.set_section_type(self.base.section_type());
                    }

                    self.guess_string_types(context, current_vram, &section_bytes[local_offset..])?;
                    symbol_list.push((local_offset, current_vram));
                    offsets_with_symbols.insert(local_offset);
                }
            }

            // The backfill pass appended new symbols out of order.
            symbol_list.sort();
        }

        self.base.process_static_relocs(context);

        let total_size = self.base.sizew() * 4;
        for (i, (offset, sym_vram)) in symbol_list.iter().enumerate() {
            let next_offset = if i + 1 == symbol_list.len() {
                total_size
            } else {
                symbol_list[i + 1].0
            };
            if *offset == next_offset {
                continue;
            }

            let words = self.base.words()[*offset / 4..next_offset / 4].to_vec();
            let sym = SymbolData::new(
                context,
                words,
                self.base.rom_offset(*offset),
                *sym_vram,
                *offset,
                self.base.parent_segment_info().clone(),
                self.base.section_type(),
                self.base.encoding(),
                self.base.comment_offset(),
            )?;

            self.data_symbols.push(sym);
            self.base.symbols_vrams_mut().insert(*sym_vram);
        }

        Ok(())
    }

    fn guess_string_types(
        &self,
        context: &mut Context,
        vram: Vram,
        bytes: &[u8],
    ) -> Result<(), OwnedSegmentNotFoundError> {
        let level = self.settings.string_guesser_level;
        let encoding = self.base.encoding();

        let owned_segment = context.find_owned_segment_mut(self.base.parent_segment_info())?;
        if let Some(metadata) =
            owned_segment.find_symbol_mut(vram, FindSettings::new().with_allow_addend(false))
        {
            let maybe_string = level.guess_c_string(metadata, bytes, encoding);
            metadata.set_maybe_string(maybe_string);

            let maybe_pascal_string = level.guess_pascal_string(metadata, bytes);
            metadata.set_maybe_pascal_string(maybe_pascal_string);
        }

        Ok(())
    }

    /// Split whatever follows the user-declared size of the symbol at
    /// `sym_vram` into its own autogenerated pad.
    fn create_pad_from_declared_size(
        &self,
        context: &mut Context,
        sym_vram: Vram,
        local_offset: usize,
        declared_size: Size,
    ) -> Result<(), OwnedSegmentNotFoundError> {
        let declared_size = declared_size.inner() as usize;
        if declared_size == 0 || local_offset + declared_size >= self.base.sizew() * 4 {
            return Ok(());
        }

        let pad_vram = sym_vram + Size::new(declared_size as u32);
        let pad_rom = self.base.rom_offset(local_offset + declared_size);

        let owned_segment = context.find_owned_segment_mut(self.base.parent_segment_info())?;
        let pad = owned_segment.add_symbol(
            pad_vram,
            Some(pad_rom),
            GeneratedBy::Autogenerated,
            Some(self.base.section_type()),
            false,
        );
        pad.set_auto_created_pad_by(sym_vram);

        Ok(())
    }
}

impl Section for SectionData {
    fn section_base(&self) -> &SectionBase {
        &self.base
    }
    fn section_base_mut(&mut self) -> &mut SectionBase {
        &mut self.base
    }

    fn symbol_count(&self) -> usize {
        self.data_symbols.len()
    }

    fn disassemble(
        &self,
        context: &Context,
        settings: &SymDisplaySettings,
    ) -> Result<String, fmt::Error> {
        let line_end = settings.line_end(context.global_config());
        let mut output = String::new();

        for (i, sym) in self.data_symbols.iter().enumerate() {
            write!(output, "{}", sym.display(context, settings))?;
            if i + 1 < self.data_symbols.len() {
                output.push_str(line_end);
            }
        }

        Ok(output)
    }
}
