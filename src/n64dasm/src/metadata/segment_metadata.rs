/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use ::polonius_the_crab::prelude::*;

use alloc::collections::{btree_map::BTreeMap, btree_set::BTreeSet};
use alloc::vec::Vec;

use rabbitizer::Vram;

use crate::{
    address_range::AddressRange, rom_address::RomAddress, rom_vram_range::RomVramRange,
    section_type::SectionType,
};

use super::{GeneratedBy, OverlayCategoryName, SymbolMetadata, SymbolType};

/// Symbol table of a single segment.
///
/// Besides the symbols themselves it tracks the pending "pointers in data"
/// queue: addresses some other section found stored as data words, waiting
/// to be promoted to real symbols the next time the section owning the
/// address gets analyzed.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMetadata {
    ranges: RomVramRange,

    category_name: Option<OverlayCategoryName>,

    symbols: BTreeMap<Vram, SymbolMetadata>,

    /// Stuff that looks like pointers. Found referenced by data.
    new_pointers_in_data: BTreeSet<Vram>,

    is_the_unknown_segment: bool,
}

impl SegmentMetadata {
    pub(crate) const fn new(
        ranges: RomVramRange,
        category_name: Option<OverlayCategoryName>,
    ) -> Self {
        Self {
            ranges,
            category_name,
            symbols: BTreeMap::new(),
            new_pointers_in_data: BTreeSet::new(),
            is_the_unknown_segment: false,
        }
    }

    /// The catch-all segment owning every address no named segment claims.
    pub(crate) fn new_unknown_segment() -> Self {
        let zero_rom = AddressRange::new(RomAddress::new(0), RomAddress::new(0));
        let zero_vram = AddressRange::new(Vram::new(0), Vram::new(0));

        Self {
            ranges: RomVramRange::new(zero_rom, zero_vram),
            category_name: None,
            symbols: BTreeMap::new(),
            new_pointers_in_data: BTreeSet::new(),
            is_the_unknown_segment: true,
        }
    }

    pub(crate) const fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }

    pub fn rom_range(&self) -> &AddressRange<RomAddress> {
        self.ranges.rom()
    }
    pub fn in_rom_range(&self, rom: RomAddress) -> bool {
        self.ranges.in_rom_range(rom)
    }

    pub fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }
    pub fn in_vram_range(&self, vram: Vram) -> bool {
        self.is_the_unknown_segment || self.ranges.in_vram_range(vram)
    }

    pub const fn category_name(&self) -> Option<&OverlayCategoryName> {
        self.category_name.as_ref()
    }

    pub const fn symbols(&self) -> &BTreeMap<Vram, SymbolMetadata> {
        &self.symbols
    }
}

fn add_symbol_impl(
    mut slf: &mut SegmentMetadata,
    vram: Vram,
    generated_by: GeneratedBy,
    allow_sym_with_addend: bool,
) -> &mut SymbolMetadata {
    // TODO: get rid of the polonius stuff when the new borrow checker has been released.

    polonius!(|slf| -> &'polonius mut SymbolMetadata {
        if let Some(x) = slf.find_symbol_mut(
            vram,
            FindSettings::new().with_allow_addend(allow_sym_with_addend),
        ) {
            polonius_return!(x);
        }
    });

    let is_the_unknown_segment = slf.is_the_unknown_segment;

    slf.symbols.entry(vram).or_insert_with(|| {
        let mut sym = SymbolMetadata::new(generated_by, vram);
        if is_the_unknown_segment {
            sym.set_unknown_segment();
        }
        sym
    })
}

impl SegmentMetadata {
    /// Fetch-or-create the symbol living at `vram`.
    ///
    /// Calling this twice with the same `vram` returns the same underlying
    /// symbol, which is what makes analysis re-runnable.
    pub(crate) fn add_symbol(
        &mut self,
        vram: Vram,
        rom: Option<RomAddress>,
        generated_by: GeneratedBy,
        section_type: Option<SectionType>,
        allow_sym_with_addend: bool,
    ) -> &mut SymbolMetadata {
        let sym = add_symbol_impl(self, vram, generated_by, allow_sym_with_addend);
        sym.update_rom(rom);
        sym.update_section_type(section_type);
        sym
    }

    pub(crate) fn add_function(
        &mut self,
        vram: Vram,
        rom: Option<RomAddress>,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        let sym = self.add_symbol(vram, rom, generated_by, Some(SectionType::Text), false);
        sym.set_type(SymbolType::Function, generated_by);
        sym
    }

    pub(crate) fn add_jumptable(
        &mut self,
        vram: Vram,
        rom: Option<RomAddress>,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        let sym = self.add_symbol(vram, rom, generated_by, None, false);
        sym.set_type(SymbolType::Jumptable, generated_by);
        sym
    }

    pub(crate) fn add_jumptable_label(
        &mut self,
        vram: Vram,
        rom: Option<RomAddress>,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        // Jumptable entries name code addresses.
        let sym = self.add_symbol(vram, rom, generated_by, Some(SectionType::Text), false);
        if sym.sym_type().is_none() {
            sym.set_type(SymbolType::JumptableLabel, generated_by);
        }
        sym
    }
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FindSettings {
    allow_addend: bool,
    check_upper_limit: bool,
}

impl FindSettings {
    pub const fn new() -> Self {
        Self {
            allow_addend: true,
            check_upper_limit: true,
        }
    }

    pub const fn with_allow_addend(self, allow_addend: bool) -> Self {
        Self {
            allow_addend,
            ..self
        }
    }

    pub const fn with_check_upper_limit(self, check_upper_limit: bool) -> Self {
        Self {
            check_upper_limit,
            ..self
        }
    }
}

impl Default for FindSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentMetadata {
    #[must_use]
    pub fn find_symbol(&self, vram: Vram, settings: FindSettings) -> Option<&SymbolMetadata> {
        if !settings.allow_addend {
            self.symbols.get(&vram)
        } else {
            let mut range = self.symbols.range(..=vram);

            if let Some((sym_vram, sym)) = range.next_back() {
                if settings.check_upper_limit && vram >= *sym_vram + sym.size() {
                    None
                } else {
                    Some(sym)
                }
            } else {
                None
            }
        }
    }

    #[must_use]
    pub fn find_symbol_mut(
        &mut self,
        vram: Vram,
        settings: FindSettings,
    ) -> Option<&mut SymbolMetadata> {
        if !settings.allow_addend {
            self.symbols.get_mut(&vram)
        } else {
            let mut range = self.symbols.range_mut(..=vram);

            if let Some((sym_vram, sym)) = range.next_back() {
                if settings.check_upper_limit && vram >= *sym_vram + sym.size() {
                    None
                } else {
                    Some(sym)
                }
            } else {
                None
            }
        }
    }

    pub(crate) fn symbols_in_range(
        &self,
        range: AddressRange<Vram>,
    ) -> impl Iterator<Item = &SymbolMetadata> {
        self.symbols
            .range(range.start()..range.end())
            .map(|(_, sym)| sym)
    }
}

impl SegmentMetadata {
    pub(crate) fn add_pointer_in_data(&mut self, vram: Vram) {
        self.new_pointers_in_data.insert(vram);
    }

    /// Take `vram` out of the pending queue, if some other section put it
    /// there.
    pub(crate) fn pop_pointer_in_data(&mut self, vram: Vram) -> Option<Vram> {
        self.new_pointers_in_data.take(&vram)
    }

    pub fn pending_pointers_in_data(&self) -> impl Iterator<Item = Vram> + '_ {
        self.new_pointers_in_data.iter().copied()
    }

    pub(crate) fn drain_pointers_in_data_range(&mut self, range: AddressRange<Vram>) -> Vec<Vram> {
        let drained: Vec<Vram> = self
            .new_pointers_in_data
            .iter()
            .copied()
            .filter(|x| range.in_range(*x))
            .collect();

        for vram in &drained {
            self.new_pointers_in_data.remove(vram);
        }

        drained
    }
}

#[cfg(test)]
mod tests {
    use crate::address_range::AddressRange;
    use crate::metadata::GeneratedBy;
    use crate::rom_address::RomAddress;
    use crate::rom_vram_range::RomVramRange;
    use crate::size::Size;

    use super::*;

    fn test_segment() -> SegmentMetadata {
        let rom_range = AddressRange::new(RomAddress::new(0), RomAddress::new(0x10000));
        let vram_range = AddressRange::new(Vram::new(0), Vram::new(0x10000));
        SegmentMetadata::new(RomVramRange::new(rom_range, vram_range), None)
    }

    #[test]
    fn check_symbol_bounds() {
        let mut segment = test_segment();

        segment.add_symbol(Vram::new(0x100C), None, GeneratedBy::Autogenerated, None, true);
        segment.add_symbol(Vram::new(0x1000), None, GeneratedBy::Autogenerated, None, true);
        segment.add_symbol(Vram::new(0x1004), None, GeneratedBy::Autogenerated, None, true);

        assert_eq!(
            segment
                .find_symbol(Vram::new(0x1000), FindSettings::new())
                .map(|sym| sym.vram()),
            Some(Vram::new(0x1000))
        );

        assert_eq!(
            segment
                .find_symbol(Vram::new(0x1002), FindSettings::new())
                .map(|sym| sym.vram()),
            Some(Vram::new(0x1000))
        );

        assert_eq!(
            segment
                .find_symbol(Vram::new(0x0F00), FindSettings::new())
                .map(|sym| sym.vram()),
            None
        );

        assert_eq!(
            segment
                .find_symbol(Vram::new(0x2000), FindSettings::new())
                .map(|sym| sym.vram()),
            None
        );

        assert_eq!(
            segment
                .find_symbol(
                    Vram::new(0x1002),
                    FindSettings::new().with_allow_addend(false)
                )
                .map(|sym| sym.vram()),
            None
        );

        assert_eq!(
            segment
                .find_symbol(
                    Vram::new(0x1100),
                    FindSettings::new().with_check_upper_limit(false)
                )
                .map(|sym| sym.vram()),
            Some(Vram::new(0x100C))
        );

        assert_eq!(
            segment
                .find_symbol(Vram::new(0x1008), FindSettings::new())
                .map(|sym| sym.vram()),
            None
        );
    }

    #[test]
    fn add_symbol_is_idempotent() {
        let mut segment = test_segment();

        let first_vram = {
            let sym = segment.add_symbol(
                Vram::new(0x2000),
                Some(RomAddress::new(0x2000)),
                GeneratedBy::Autogenerated,
                Some(SectionType::Data),
                false,
            );
            *sym.user_declared_size_mut() = Some(Size::new(0x10));
            sym.vram()
        };

        let again = segment.add_symbol(
            Vram::new(0x2000),
            None,
            GeneratedBy::UserDeclared,
            None,
            false,
        );

        assert_eq!(again.vram(), first_vram);
        // The original attributes survived the second `add_symbol`.
        assert_eq!(again.generated_by(), GeneratedBy::Autogenerated);
        assert_eq!(again.user_declared_size(), Some(Size::new(0x10)));
        assert_eq!(again.rom(), Some(RomAddress::new(0x2000)));
        assert_eq!(segment.symbols().len(), 1);
    }

    #[test]
    fn pointer_queue_pops_only_once() {
        let mut segment = test_segment();

        segment.add_pointer_in_data(Vram::new(0x3000));

        assert_eq!(segment.pop_pointer_in_data(Vram::new(0x3000)), Some(Vram::new(0x3000)));
        assert_eq!(segment.pop_pointer_in_data(Vram::new(0x3000)), None);
    }
}
