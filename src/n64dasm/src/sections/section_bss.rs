/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::{string::String, vec::Vec};
use core::fmt;
use core::fmt::Write;

use rabbitizer::Vram;

use crate::{
    address_range::AddressRange,
    context::{Context, OwnedSegmentNotFoundError},
    metadata::GeneratedBy,
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    symbols::{display::SymDisplaySettings, SymbolBss},
};

use super::{Section, SectionBase, SectionCreationError};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SectionBssSettings {}

impl SectionBssSettings {
    pub fn new() -> Self {
        Self {}
    }
}
impl Default for SectionBssSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// An uninitialized-data section. It has no words to inspect, so the
/// partitioning comes entirely from whatever the Context already knows about
/// its address range.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SectionBss {
    base: SectionBase,

    bss_symbols: Vec<SymbolBss>,
}

impl SectionBss {
    pub(crate) fn new(
        context: &mut Context,
        _settings: &SectionBssSettings,
        name: String,
        vram_range: AddressRange<Vram>,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<Self, SectionCreationError> {
        context.find_owned_segment(&parent_segment_info)?;

        let base =
            SectionBase::new_vram_only(name, vram_range, SectionType::Bss, parent_segment_info);

        Ok(Self {
            base,
            bss_symbols: Vec::new(),
        })
    }

    pub fn bss_symbols(&self) -> &[SymbolBss] {
        &self.bss_symbols
    }
}

impl SectionBss {
    /// Partition the vram range into spans, one per known symbol. Pending
    /// pointer discoveries landing in this range get promoted first.
    pub fn analyze(&mut self, context: &mut Context) -> Result<(), OwnedSegmentNotFoundError> {
        self.bss_symbols.clear();
        self.base.reset_analysis_state();
        self.base.check_and_create_first_symbol(context)?;

        let vram_range = *self.base.vram_range();

        {
            let owned_segment = context.find_owned_segment_mut(self.base.parent_segment_info())?;
            for pending_vram in owned_segment.drain_pointers_in_data_range(vram_range) {
                owned_segment.add_symbol(
                    pending_vram,
                    None,
                    GeneratedBy::Autogenerated,
                    Some(SectionType::Bss),
                    false,
                );
            }
        }

        let symbols_info: Vec<Vram> = {
            let owned_segment = context.find_owned_segment(self.base.parent_segment_info())?;
            owned_segment
                .symbols_in_range(vram_range)
                .map(|metadata| metadata.vram())
                .collect()
        };

        for (i, sym_vram) in symbols_info.iter().enumerate() {
            let sym_vram_end = if i + 1 < symbols_info.len() {
                symbols_info[i + 1]
            } else {
                vram_range.end()
            };
            debug_assert!(
                *sym_vram < sym_vram_end,
                "{:?} {} {}",
                vram_range,
                sym_vram,
                sym_vram_end
            );

            let in_file_offset = (*sym_vram - vram_range.start()).inner() as usize;
            let sym = SymbolBss::new(
                context,
                AddressRange::new(*sym_vram, sym_vram_end),
                in_file_offset,
                self.base.parent_segment_info().clone(),
            )?;

            self.bss_symbols.push(sym);
            self.base.symbols_vrams_mut().insert(*sym_vram);
        }

        Ok(())
    }
}

impl Section for SectionBss {
    fn section_base(&self) -> &SectionBase {
        &self.base
    }
    fn section_base_mut(&mut self) -> &mut SectionBase {
        &mut self.base
    }

    fn symbol_count(&self) -> usize {
        self.bss_symbols.len()
    }

    fn disassemble(
        &self,
        context: &Context,
        settings: &SymDisplaySettings,
    ) -> Result<String, fmt::Error> {
        let line_end = settings.line_end(context.global_config());
        let mut output = String::new();

        for (i, sym) in self.bss_symbols.iter().enumerate() {
            write!(output, "{}", sym.display(context, settings))?;
            if i + 1 < self.bss_symbols.len() {
                output.push_str(line_end);
            }
        }

        Ok(output)
    }
}
