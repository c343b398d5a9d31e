/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::{
    collections::btree_set::BTreeSet,
    format,
    string::String,
    vec::Vec,
};
use core::fmt::Write;

use rabbitizer::Vram;

use crate::{
    address_range::AddressRange,
    config::{be_bytes_from_words, GlobalConfig, PolicyFlags},
    context::{Context, OwnedSegmentNotFoundError},
    metadata::{segment_metadata::FindSettings, GeneratedBy},
    parent_segment_info::ParentSegmentInfo,
    rom_address::RomAddress,
    rom_vram_range::RomVramRange,
    section_type::SectionType,
    size::Size,
    str_decoding::Encoding,
};

/// State and behaviors shared by every section kind: the addressing triple,
/// the word buffer, and the Context plumbing that lets sections discover
/// symbols for each other.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBase {
    name: String,

    ranges: RomVramRange,

    section_type: SectionType,

    parent_segment_info: ParentSegmentInfo,

    encoding: Encoding,

    words: Vec<u32>,

    /// Local offsets known to hold pointers, fed by the instruction analyzer
    /// of the text sections that reference this one.
    pointers_offsets: BTreeSet<usize>,

    symbols_vrams: BTreeSet<Vram>,

    /// Words that referenced an already-known symbol, waiting for
    /// `process_static_relocs`.
    static_references: Vec<(RomAddress, Vram)>,

    comment_offset: Size,
}

impl SectionBase {
    pub(crate) fn new(
        name: String,
        words: Vec<u32>,
        rom: RomAddress,
        vram: Vram,
        section_type: SectionType,
        parent_segment_info: ParentSegmentInfo,
        encoding: Encoding,
    ) -> Self {
        let size = Size::new(words.len() as u32 * 4);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);

        Self {
            name,
            ranges: RomVramRange::new(rom_range, vram_range),
            section_type,
            parent_segment_info,
            encoding,
            words,
            pointers_offsets: BTreeSet::new(),
            symbols_vrams: BTreeSet::new(),
            static_references: Vec::new(),
            comment_offset: Size::new(0),
        }
    }

    /// A section which only exists as a vram range, with no backing bytes.
    pub(crate) fn new_vram_only(
        name: String,
        vram_range: AddressRange<Vram>,
        section_type: SectionType,
        parent_segment_info: ParentSegmentInfo,
    ) -> Self {
        let rom_range = AddressRange::new(RomAddress::new(0), RomAddress::new(0));

        Self {
            name,
            ranges: RomVramRange::new(rom_range, vram_range),
            section_type,
            parent_segment_info,
            encoding: Encoding::Ascii,
            words: Vec::new(),
            pointers_offsets: BTreeSet::new(),
            symbols_vrams: BTreeSet::new(),
            static_references: Vec::new(),
            comment_offset: Size::new(0),
        }
    }
}

impl SectionBase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }
    pub const fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }
    pub const fn rom_range(&self) -> &AddressRange<RomAddress> {
        self.ranges.rom()
    }

    pub const fn section_type(&self) -> SectionType {
        self.section_type
    }

    pub const fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }
    pub fn sizew(&self) -> usize {
        self.words.len()
    }

    pub const fn comment_offset(&self) -> Size {
        self.comment_offset
    }
    pub(crate) fn set_comment_offset(&mut self, comment_offset: Size) {
        self.comment_offset = comment_offset;
    }

    pub fn vram_offset(&self, local_offset: usize) -> Vram {
        self.ranges.vram().start() + Size::new(local_offset as u32)
    }
    pub fn rom_offset(&self, local_offset: usize) -> RomAddress {
        self.ranges.rom().start() + Size::new(local_offset as u32)
    }
    pub fn contains_vram(&self, vram: Vram) -> bool {
        self.ranges.in_vram_range(vram)
    }

    /// Restartable, strictly ascending iteration of `(local_offset, word)`.
    pub fn word_iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.words.iter().enumerate().map(|(i, w)| (i * 4, *w))
    }

    pub fn pointers_offsets(&self) -> &BTreeSet<usize> {
        &self.pointers_offsets
    }
    /// Mark a local offset as known to hold a pointer. Offsets outside the
    /// section or unaligned ones are silently dropped.
    pub fn add_pointer_offset(&mut self, local_offset: usize) {
        if local_offset % 4 == 0 && local_offset < self.words.len() * 4 {
            self.pointers_offsets.insert(local_offset);
        }
    }

    pub fn symbols_vrams(&self) -> &BTreeSet<Vram> {
        &self.symbols_vrams
    }
    pub(crate) fn symbols_vrams_mut(&mut self) -> &mut BTreeSet<Vram> {
        &mut self.symbols_vrams
    }

    pub(crate) fn reset_analysis_state(&mut self) {
        self.symbols_vrams.clear();
        self.static_references.clear();
    }
}

impl SectionBase {
    /// Make sure the very start of the section has a symbol, so partitioning
    /// always has an initial anchor.
    pub(crate) fn check_and_create_first_symbol(
        &self,
        context: &mut Context,
    ) -> Result<(), OwnedSegmentNotFoundError> {
        if !context
            .global_config()
            .policy()
            .contains(PolicyFlags::ADD_NEW_SYMBOLS)
        {
            return Ok(());
        }
        if self.vram_range().size().inner() == 0 {
            return Ok(());
        }

        let vram = self.vram_offset(0);
        let rom = if self.sizew() > 0 {
            Some(self.rom_offset(0))
        } else {
            None
        };

        let owned_segment = context.find_owned_segment_mut(&self.parent_segment_info)?;
        let metadata = owned_segment.add_symbol(
            vram,
            rom,
            GeneratedBy::Autogenerated,
            Some(self.section_type),
            false,
        );
        metadata.set_defined();

        Ok(())
    }

    /// Take `vram` out of the pending pointers-in-data queue, iff some other
    /// section queued it as a pointer target.
    pub(crate) fn pop_pointer_in_data_reference(
        &self,
        context: &mut Context,
        vram: Vram,
    ) -> Option<Vram> {
        context
            .find_owned_segment_mut(&self.parent_segment_info)
            .ok()?
            .pop_pointer_in_data(vram)
    }

    /// Whether `word` looks like a vram pointer into some known segment.
    ///
    /// Targets which aren't symbols yet get queued as pending discoveries;
    /// targets which already are get remembered as static references.
    pub(crate) fn check_word_is_a_symbol_reference(
        &mut self,
        context: &mut Context,
        rom: RomAddress,
        word: u32,
    ) -> bool {
        let word_vram = Vram::new(word);

        let already_a_symbol = context
            .find_referenced_segment(word_vram, &self.parent_segment_info)
            .map(|segment| segment.find_symbol(word_vram, FindSettings::new()).is_some());

        match already_a_symbol {
            Some(true) => {
                self.static_references.push((rom, word_vram));
                true
            }
            Some(false) => {
                context.add_pointer_in_data_reference(word_vram, &self.parent_segment_info);
                true
            }
            None => false,
        }
    }

    /// Apply the static references accumulated during analysis by bumping
    /// the reference counter of each pointed-to symbol.
    pub(crate) fn process_static_relocs(&mut self, context: &mut Context) {
        let references = core::mem::take(&mut self.static_references);

        for (_rom, word_vram) in references {
            if let Some(segment) =
                context.find_referenced_segment_mut(word_vram, &self.parent_segment_info)
            {
                if let Some(metadata) = segment.find_symbol_mut(word_vram, FindSettings::new()) {
                    metadata.increment_reference_counter();
                }
            }
        }
    }
}

impl SectionBase {
    /// The canonical big-endian serialization of the word buffer.
    pub fn be_bytes(&self) -> Vec<u8> {
        be_bytes_from_words(&self.words)
    }

    /// Stable digest of the section contents: same bytes, same hash.
    pub fn hash_str(&self) -> String {
        format!("{:x}", md5::compute(self.be_bytes()))
    }

    pub fn compare_to(&self, other: &SectionBase) -> SectionComparison {
        let hash_one = self.hash_str();
        let hash_two = other.hash_str();
        let equal = hash_one == hash_two;

        let mut diff_bytes = 0;
        let mut diff_words = 0;

        if !equal {
            let min_len = self.sizew().min(other.sizew());

            for i in 0..min_len {
                let a = self.words[i];
                let b = other.words[i];

                for j in 0..4 {
                    if (a & (0xFF << (j * 8))) != (b & (0xFF << (j * 8))) {
                        diff_bytes += 1;
                    }
                }
                if a != b {
                    diff_words += 1;
                }
            }
        }

        SectionComparison {
            equal,
            hash_one,
            hash_two,
            size_one: Size::new(self.sizew() as u32 * 4),
            size_two: Size::new(other.sizew() as u32 * 4),
            diff_bytes,
            diff_words,
        }
    }

    /// Zero out the low bytes of every word which looks like a pointer,
    /// keeping only the top byte: either a KSEG0 address (`0x80......`) or a
    /// small `0x0X......` segment-tagged one.
    ///
    /// This classifier is N64-specific. Reports whether any word changed,
    /// and applying it a second time changes nothing.
    pub(crate) fn remove_pointers_words(&mut self) -> bool {
        let mut was_updated = false;

        for word in self.words.iter_mut() {
            let top_byte = (*word >> 24) & 0xFF;

            let looks_like_pointer =
                top_byte == 0x80 || ((top_byte & 0xF0) == 0x00 && (top_byte & 0x0F) != 0x00);

            if looks_like_pointer && *word != top_byte << 24 {
                *word = top_byte << 24;
                was_updated = true;
            }
        }

        was_updated
    }

    pub fn asm_prelude(&self, global_config: &GlobalConfig) -> String {
        let line_end = global_config.line_end();
        let mut output = String::new();

        let w = &mut output;
        let _ = write!(w, ".include \"macro.inc\"{}", line_end);
        let _ = write!(w, "{}", line_end);
        let _ = write!(w, "# assembler directives{}", line_end);
        let _ = write!(w, ".set noat      # allow manual use of $at{}", line_end);
        let _ = write!(w, ".set noreorder # don't insert nops after branches{}", line_end);
        let _ = write!(
            w,
            ".set gp=64     # allow use of 64-bit general purpose registers{}",
            line_end
        );
        let _ = write!(w, "{}", line_end);
        let _ = write!(w, ".section {}{}", self.section_type.section_name(), line_end);
        let _ = write!(w, "{}", line_end);
        let _ = write!(w, ".balign 16{}", line_end);

        output
    }
}

/// The outcome of diffing two sections word by word.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct SectionComparison {
    pub equal: bool,
    pub hash_one: String,
    pub hash_two: String,
    pub size_one: Size,
    pub size_two: Size,
    /// Bytes differing within the common prefix of both sections.
    pub diff_bytes: u32,
    /// Word positions differing within the common prefix of both sections.
    pub diff_words: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_section(words: Vec<u32>) -> SectionBase {
        SectionBase::new(
            String::from(".data"),
            words,
            RomAddress::new(0x1000),
            Vram::new(0x80001000),
            SectionType::Data,
            ParentSegmentInfo::new(RomAddress::new(0), None),
            Encoding::Ascii,
        )
    }

    #[test]
    fn hash_matches_iff_words_match() {
        let a = plain_section(alloc::vec![0x80001004, 0x0000_0000]);
        let b = plain_section(alloc::vec![0x80001004, 0x0000_0000]);
        let c = plain_section(alloc::vec![0x80001004, 0x0000_0001]);

        assert_eq!(a.hash_str(), b.hash_str());
        assert_ne!(a.hash_str(), c.hash_str());
    }

    #[test]
    fn comparison_counts_bytes_and_words() {
        let a = plain_section(alloc::vec![0x00112233, 0x44556677, 0x8899AABB]);
        let b = plain_section(alloc::vec![0x00112233, 0x44FF6677, 0x00000000]);

        let comparison = a.compare_to(&b);

        assert!(!comparison.equal);
        assert_eq!(comparison.size_one, Size::new(12));
        assert_eq!(comparison.size_two, Size::new(12));
        assert_eq!(comparison.diff_words, 2);
        assert_eq!(comparison.diff_bytes, 4);
    }

    #[test]
    fn comparison_against_shorter_section() {
        let a = plain_section(alloc::vec![0x00112233, 0x44556677]);
        let b = plain_section(alloc::vec![0x00112233]);

        let comparison = a.compare_to(&b);

        assert!(!comparison.equal);
        assert_eq!(comparison.diff_words, 0);
        assert_eq!(comparison.diff_bytes, 0);
        assert_eq!(comparison.size_one, Size::new(8));
        assert_eq!(comparison.size_two, Size::new(4));
    }

    #[test]
    fn pointer_removal_is_idempotent() {
        let mut section = plain_section(alloc::vec![
            0x80123456, 0x04ABCDEF, 0x00FFFFFF, 0x90000000,
        ]);

        assert!(section.remove_pointers_words());
        assert_eq!(
            section.words(),
            [0x80000000, 0x04000000, 0x00FFFFFF, 0x90000000]
        );

        // Second application changes nothing.
        assert!(!section.remove_pointers_words());
        assert_eq!(
            section.words(),
            [0x80000000, 0x04000000, 0x00FFFFFF, 0x90000000]
        );
    }
}
