/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::{fmt, hash::Hash};

use rabbitizer::{access_type::AccessType, Vram};

use crate::{
    config::Compiler, rom_address::RomAddress, section_type::SectionType, size::Size,
};

use super::{SymbolMetadataNameDisplay, SymbolType};

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum GeneratedBy {
    /// This symbol was automatically generated by the disassembler
    Autogenerated,
    /// Declared externally by the user, but it may have not been found yet
    UserDeclared,
}

/// The authoritative record for a named address.
///
/// Owned by the segment that first observed the address; sections and spans
/// refer back to it by vram instead of holding references, so it outlives
/// every individual section.
#[derive(Clone)]
pub struct SymbolMetadata {
    generated_by: GeneratedBy,
    vram: Vram,
    rom: Option<RomAddress>,

    user_declared_name: Option<String>,

    user_declared_size: Option<Size>,
    autodetected_size: Option<Size>,

    user_declared_type: Option<SymbolType>,
    autodetected_type: Option<SymbolType>,

    section_type: Option<SectionType>,

    /// This symbol exists (was found) in any of the analyzed sections
    is_defined: bool,

    /// How code accesses this symbol, recorded by the text analyzer from the
    /// load/store instructions referencing it. The `bool` tells whether the
    /// access was unsigned.
    access_type: Option<(AccessType, bool)>,

    is_maybe_string: bool,
    is_maybe_pascal_string: bool,

    /// Accessed through the global offset table, so words pointing at this
    /// symbol are `$gp`-relative instead of absolute.
    is_got: bool,

    /// The address was not claimed by any known segment.
    unknown_segment: bool,

    /// Synthesized to keep a user-declared size from swallowing the rest of
    /// the section. Holds the vram of the symbol that caused it.
    auto_created_pad_by: Option<Vram>,

    /// How many times something referenced this symbol.
    reference_counter: u32,
}

impl SymbolMetadata {
    pub(crate) fn new(generated_by: GeneratedBy, vram: Vram) -> Self {
        Self {
            generated_by,
            vram,
            rom: None,

            user_declared_name: None,

            user_declared_size: None,
            autodetected_size: None,
            user_declared_type: None,
            autodetected_type: None,

            section_type: None,

            is_defined: false,

            access_type: None,

            is_maybe_string: false,
            is_maybe_pascal_string: false,
            is_got: false,
            unknown_segment: false,
            auto_created_pad_by: None,
            reference_counter: 0,
        }
    }

    pub fn generated_by(&self) -> GeneratedBy {
        self.generated_by
    }

    pub const fn vram(&self) -> Vram {
        self.vram
    }

    pub fn rom(&self) -> Option<RomAddress> {
        self.rom
    }
    pub(crate) fn update_rom(&mut self, rom: Option<RomAddress>) {
        if self.rom.is_none() {
            self.rom = rom;
        }
    }

    pub fn display_name(&self) -> SymbolMetadataNameDisplay {
        SymbolMetadataNameDisplay::new(self)
    }

    pub fn user_declared_name(&self) -> Option<&str> {
        self.user_declared_name.as_deref()
    }
    pub fn user_declared_name_mut(&mut self) -> &mut Option<String> {
        &mut self.user_declared_name
    }

    pub fn user_declared_size(&self) -> Option<Size> {
        self.user_declared_size
    }
    pub fn user_declared_size_mut(&mut self) -> &mut Option<Size> {
        &mut self.user_declared_size
    }
    pub fn has_user_declared_size(&self) -> bool {
        self.user_declared_size.is_some()
    }
    pub fn autodetected_size(&self) -> Option<Size> {
        self.autodetected_size
    }
    pub(crate) fn set_autodetected_size(&mut self, size: Size) {
        self.autodetected_size = Some(size);
    }

    /// The size this symbol is believed to have, defaulting to one word when
    /// nothing better is known.
    pub fn size(&self) -> Size {
        if let Some(siz) = self.user_declared_size {
            return siz;
        }
        if let Some(siz) = self.autodetected_size {
            return siz;
        }

        Size::new(4)
    }

    pub fn sym_type(&self) -> Option<SymbolType> {
        if self.user_declared_type.is_some() {
            self.user_declared_type
        } else {
            self.autodetected_type
        }
    }
    pub fn user_declared_type(&self) -> Option<SymbolType> {
        self.user_declared_type
    }
    pub fn user_declared_type_mut(&mut self) -> &mut Option<SymbolType> {
        &mut self.user_declared_type
    }
    pub fn autodetected_type(&self) -> Option<SymbolType> {
        self.autodetected_type
    }
    pub(crate) fn set_type(&mut self, new_type: SymbolType, generated_by: GeneratedBy) {
        match generated_by {
            GeneratedBy::Autogenerated => self.autodetected_type = Some(new_type),
            GeneratedBy::UserDeclared => self.user_declared_type = Some(new_type),
        }
    }

    pub fn section_type(&self) -> Option<SectionType> {
        self.section_type
    }
    pub(crate) fn update_section_type(&mut self, section_type: Option<SectionType>) {
        if self.section_type.is_none() {
            self.section_type = section_type;
        }
    }
    pub(crate) fn set_section_type(&mut self, section_type: SectionType) {
        self.section_type = Some(section_type);
    }

    pub fn is_defined(&self) -> bool {
        self.is_defined
    }
    pub(crate) fn set_defined(&mut self) {
        self.is_defined = true;
    }

    pub fn access_type(&self) -> Option<(AccessType, bool)> {
        self.access_type
    }
    /// Record how code accesses this symbol. Data analysis can't tell a
    /// float from a word on its own, so scalar types beyond what the user
    /// declares come from the width of the loads and stores the text
    /// analyzer saw.
    pub fn set_access_type_if_unset(&mut self, access_type: (AccessType, bool)) {
        if self.access_type.is_some() {
            return;
        }
        self.access_type = Some(access_type);

        if self.autodetected_type.is_none() {
            self.autodetected_type = match access_type.0 {
                AccessType::BYTE => Some(SymbolType::Byte),
                AccessType::SHORT => Some(SymbolType::Short),
                AccessType::WORD => Some(SymbolType::Word),
                AccessType::DOUBLEWORD | AccessType::QUADWORD => Some(SymbolType::DWord),
                AccessType::FLOAT => Some(SymbolType::Float32),
                AccessType::DOUBLEFLOAT => Some(SymbolType::Float64),

                _ => None,
            };
        }
    }

    pub fn is_maybe_string(&self) -> bool {
        self.is_maybe_string
    }
    pub(crate) fn set_maybe_string(&mut self, value: bool) {
        self.is_maybe_string = value;
    }
    pub fn is_maybe_pascal_string(&self) -> bool {
        self.is_maybe_pascal_string
    }
    pub(crate) fn set_maybe_pascal_string(&mut self, value: bool) {
        self.is_maybe_pascal_string = value;
    }

    pub fn is_got(&self) -> bool {
        self.is_got
    }
    pub fn set_got(&mut self, value: bool) {
        self.is_got = value;
    }

    pub fn unknown_segment(&self) -> bool {
        self.unknown_segment
    }
    pub(crate) fn set_unknown_segment(&mut self) {
        self.unknown_segment = true;
    }

    pub fn auto_created_pad_by(&self) -> Option<Vram> {
        self.auto_created_pad_by
    }
    pub(crate) fn set_auto_created_pad_by(&mut self, vram: Vram) {
        self.auto_created_pad_by = Some(vram);
    }
    pub fn is_auto_created_pad(&self) -> bool {
        self.auto_created_pad_by.is_some()
    }

    /// How much this symbol is referenced by something else
    pub fn reference_counter(&self) -> u32 {
        self.reference_counter
    }
    pub(crate) fn increment_reference_counter(&mut self) {
        self.reference_counter += 1;
    }
}

impl SymbolMetadata {
    pub fn is_jumptable(&self) -> bool {
        self.sym_type() == Some(SymbolType::Jumptable)
    }

    pub fn is_late_rodata(&self, compiler: Compiler) -> bool {
        self.sym_type()
            .is_some_and(|x| x.is_late_rodata(compiler))
    }
}

impl PartialEq for SymbolMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.vram == other.vram && self.rom == other.rom
    }
}
impl PartialOrd for SymbolMetadata {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        match self.vram.partial_cmp(&other.vram) {
            Some(core::cmp::Ordering::Equal) => {}
            ord => return ord,
        };
        self.rom.partial_cmp(&other.rom)
    }
}
impl Hash for SymbolMetadata {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.vram.hash(state);
        self.rom.hash(state);
    }
}

impl fmt::Debug for SymbolMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SymbolMetadata {{ vram: 0x{}, name: \"{}\" }}",
            self.vram,
            self.display_name()
        )
    }
}
