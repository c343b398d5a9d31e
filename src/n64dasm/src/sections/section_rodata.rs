/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::{string::String, vec::Vec};
use core::fmt;
use core::fmt::Write;

use rabbitizer::Vram;

use crate::{
    config::{Compiler, PolicyFlags},
    context::{Context, OwnedSegmentNotFoundError},
    metadata::{segment_metadata::FindSettings, GeneratedBy},
    parent_segment_info::ParentSegmentInfo,
    rom_address::RomAddress,
    section_type::SectionType,
    size::Size,
    symbols::{display::SymDisplaySettings, SymbolRodata},
};

use super::{Section, SectionBase, SectionCreationError, SectionDataSettings};

/// What the rodata scan needs to remember about the most recently seen
/// symbol while walking the words.
#[derive(Debug, Clone, Copy)]
struct SymbolSnapshot {
    is_jumptable: bool,
    is_got: bool,
    has_user_declared_size: bool,
    size: Size,
}

/// A read-only data section.
///
/// On top of the plain data partitioning it recognizes jumptables (including
/// `$gp`-relative ones), tracks late rodata, and infers source-file
/// boundaries from alignment padding.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SectionRodata {
    base: SectionBase,

    settings: SectionDataSettings,

    rodata_symbols: Vec<SymbolRodata>,

    /// Local offsets where a source-file split is inferred. Sorted, distinct
    /// multiples of 16.
    file_boundaries: Vec<usize>,
}

impl SectionRodata {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        context: &mut Context,
        settings: &SectionDataSettings,
        name: String,
        raw_bytes: &[u8],
        rom: RomAddress,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<Self, SectionCreationError> {
        if (rom.inner() % 4) != (vram.inner() % 4) {
            return Err(SectionCreationError::RomVramAlignmentMismatch {
                name,
                rom,
                vram,
                multiple_of: 4,
            });
        }

        context.find_owned_segment(&parent_segment_info)?;

        let endian = context
            .global_config()
            .endian_for_section(SectionType::Rodata);
        let words = endian.words_from_bytes(raw_bytes);

        let encoding = settings
            .encoding()
            .unwrap_or(crate::str_decoding::Encoding::default_for_section(
                SectionType::Rodata,
            ));

        let base = SectionBase::new(
            name,
            words,
            rom,
            vram,
            SectionType::Rodata,
            parent_segment_info,
            encoding,
        );

        Ok(Self {
            base,
            settings: *settings,
            rodata_symbols: Vec::new(),
            file_boundaries: Vec::new(),
        })
    }

    pub fn rodata_symbols(&self) -> &[SymbolRodata] {
        &self.rodata_symbols
    }

    pub fn file_boundaries(&self) -> &[usize] {
        &self.file_boundaries
    }

    pub fn set_comment_offset(&mut self, comment_offset: Size) {
        self.base.set_comment_offset(comment_offset);
        for sym in self.rodata_symbols.iter_mut() {
            sym.set_comment_offset(comment_offset);
        }
    }

    fn symbol_snapshot(
        &self,
        context: &Context,
        vram: Vram,
    ) -> Result<Option<SymbolSnapshot>, OwnedSegmentNotFoundError> {
        let owned_segment = context.find_owned_segment(self.base.parent_segment_info())?;

        Ok(owned_segment
            .find_symbol(vram, FindSettings::new().with_allow_addend(false))
            .map(|metadata| SymbolSnapshot {
                is_jumptable: metadata.is_jumptable(),
                is_got: metadata.is_got(),
                has_user_declared_size: metadata.has_user_declared_size(),
                size: metadata.size(),
            }))
    }
}

impl SectionRodata {
    /// Partition the section into [`SymbolRodata`] spans.
    ///
    /// Words are walked with a small jumptable state machine on top of the
    /// plain data rules: once a jumptable symbol is hit every following word
    /// is read as a code label address until a zero word, a new symbol or a
    /// change of the address' top byte ends the table.
    pub fn analyze(&mut self, context: &mut Context) -> Result<(), OwnedSegmentNotFoundError> {
        self.rodata_symbols.clear();
        self.file_boundaries.clear();
        self.base.reset_analysis_state();
        self.base.check_and_create_first_symbol(context)?;

        let section_bytes = self.base.be_bytes();
        let compiler = context.global_config().compiler();
        let create_pads = context
            .global_config()
            .policy()
            .contains(PolicyFlags::CREATE_RODATA_PADS);
        let gp_value = context.global_config().gp_config().map(|x| x.gp_value());

        let mut symbol_list: Vec<(usize, Vram)> = Vec::new();

        let mut last_vram_symbol: Option<SymbolSnapshot> = None;

        let mut part_of_jump_table = false;
        let mut first_jumptable_word = 0u32;

        for i in 0..self.base.sizew() {
            let local_offset = i * 4;
            let word = self.base.words()[i];
            let current_vram = self.base.vram_offset(local_offset);
            let current_rom = self.base.rom_offset(local_offset);

            let exact_match = self.symbol_snapshot(context, current_vram)?;
            let mut symbol_at_this_offset = exact_match.is_some();

            if let Some(snapshot) = exact_match {
                last_vram_symbol = Some(snapshot);
            }

            if exact_match.is_some_and(|x| x.is_jumptable) {
                part_of_jump_table = true;
                first_jumptable_word = word;
            } else if part_of_jump_table {
                // The last symbol found was part of a jumptable, check if
                // this word still is part of it.

                if self.base.pointers_offsets().contains(&local_offset) {
                    // Known to hold a pointer, keep going.
                } else if word == 0 {
                    part_of_jump_table = false;
                } else if exact_match.is_some() {
                    part_of_jump_table = false;
                } else if ((word >> 24) & 0xFF) != ((first_jumptable_word >> 24) & 0xFF) {
                    part_of_jump_table = false;
                    if last_vram_symbol.is_some_and(|x| x.is_jumptable && x.is_got)
                        && gp_value.is_some()
                    {
                        // GOT tables hold `$gp`-relative displacements, whose
                        // top byte naturally varies.
                        part_of_jump_table = true;
                    }
                }
            }

            if part_of_jump_table {
                let label_vram =
                    if last_vram_symbol.is_some_and(|x| x.is_got) && gp_value.is_some() {
                        let gp = gp_value.expect("Just checked above");
                        Vram::new(gp.inner().wrapping_add_signed(word as i32))
                    } else {
                        Vram::new(word)
                    };

                let label = context.add_jumptable_label(
                    label_vram,
                    self.base.parent_segment_info(),
                    GeneratedBy::Autogenerated,
                );
                if label.unknown_segment() {
                    part_of_jump_table = false;
                } else {
                    label.increment_reference_counter();
                }
            }

            if !part_of_jump_table {
                if self
                    .base
                    .pop_pointer_in_data_reference(context, current_vram)
                    .is_some()
                {
                    {
                        let owned_segment =
                            context.find_owned_segment_mut(self.base.parent_segment_info())?;
                        owned_segment.add_symbol(
                            current_vram,
                            Some(current_rom),
                            GeneratedBy::Autogenerated,
                            Some(self.base.section_type()),
                            false,
                        );
                    }
                    self.guess_string_types(context, current_vram, &section_bytes[local_offset..])?;
                    last_vram_symbol = self.symbol_snapshot(context, current_vram)?;
                    symbol_at_this_offset = true;
                } else if exact_match.is_some() {
                    self.guess_string_types(context, current_vram, &section_bytes[local_offset..])?;
                } else if last_vram_symbol.is_some_and(|x| x.is_jumptable) && word != 0 {
                    // A non-zero word right past a jumptable can't belong to
                    // it anymore, so it gets its own symbol.
                    {
                        let owned_segment =
                            context.find_owned_segment_mut(self.base.parent_segment_info())?;
                        owned_segment.add_symbol(
                            current_vram,
                            Some(current_rom),
                            GeneratedBy::Autogenerated,
                            Some(self.base.section_type()),
                            false,
                        );
                    }
                    self.guess_string_types(context, current_vram, &section_bytes[local_offset..])?;
                    last_vram_symbol = self.symbol_snapshot(context, current_vram)?;
                    symbol_at_this_offset = true;
                }

                self.base
                    .check_word_is_a_symbol_reference(context, current_rom, word);
            }

            if symbol_at_this_offset {
                self.base.symbols_vrams_mut().insert(current_vram);
                symbol_list.push((local_offset, current_vram));

                if create_pads && exact_match.is_some_and(|x| x.has_user_declared_size) {
                    let snapshot = exact_match.expect("Just checked above");
                    self.create_pad_from_declared_size(
                        context,
                        current_vram,
                        local_offset,
                        snapshot.size,
                    )?;
                }
            }
        }

        let mut previous_symbol_was_late_rodata = false;
        let mut previous_symbol_extra_padding = 0;

        let total_size = self.base.sizew() * 4;
        for (i, (offset, sym_vram)) in symbol_list.iter().enumerate() {
            let next_offset = if i + 1 == symbol_list.len() {
                total_size
            } else {
                symbol_list[i + 1].0
            };

            let words = self.base.words()[*offset / 4..next_offset / 4].to_vec();
            let sym = SymbolRodata::new(
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

            let is_late_rodata = sym.is_late_rodata(context);

            // Files are always 0x10 aligned, so only those offsets can split
            // them.
            if sym.in_file_offset() % 16 == 0 {
                if previous_symbol_was_late_rodata && !is_late_rodata {
                    // Late rodata followed by normal rodata implies a file
                    // split.
                    self.file_boundaries.push(sym.in_file_offset());
                } else if previous_symbol_extra_padding > 0 {
                    if sym.is_double(context, 0) {
                        // Doubles require a bit extra of alignment.
                        if previous_symbol_extra_padding >= 2 {
                            self.file_boundaries.push(sym.in_file_offset());
                        }
                    } else if sym.is_jumptable(context) && compiler != Compiler::IDO {
                        // Non-IDO compilers align jumptables to a 0x8
                        // boundary.
                        if previous_symbol_extra_padding >= 2 {
                            self.file_boundaries.push(sym.in_file_offset());
                        }
                    } else {
                        self.file_boundaries.push(sym.in_file_offset());
                    }
                }
            }

            previous_symbol_was_late_rodata = is_late_rodata;
            previous_symbol_extra_padding = sym.count_extra_padding(context);

            self.rodata_symbols.push(sym);
            self.base.symbols_vrams_mut().insert(*sym_vram);
        }

        self.base.process_static_relocs(context);

        self.file_boundaries.sort_unstable();
        self.file_boundaries.dedup();

        Ok(())
    }

    fn guess_string_types(
        &self,
        context: &mut Context,
        vram: Vram,
        bytes: &[u8],
    ) -> Result<(), OwnedSegmentNotFoundError> {
        let level = self.settings.string_guesser_level();
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

impl Section for SectionRodata {
    fn section_base(&self) -> &SectionBase {
        &self.base
    }
    fn section_base_mut(&mut self) -> &mut SectionBase {
        &mut self.base
    }

    fn symbol_count(&self) -> usize {
        self.rodata_symbols.len()
    }

    fn disassemble(
        &self,
        context: &Context,
        settings: &SymDisplaySettings,
    ) -> Result<String, fmt::Error> {
        let line_end = settings.line_end(context.global_config());
        let mut output = String::new();

        for (i, sym) in self.rodata_symbols.iter().enumerate() {
            write!(output, "{}", sym.display(context, settings))?;
            if i + 1 < self.rodata_symbols.len() {
                output.push_str(line_end);
            }
        }

        Ok(output)
    }
}
