/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_set::BTreeSet;
use alloc::string::String;
use core::fmt;

use rabbitizer::Vram;

use crate::address_range::AddressRange;
use crate::config::{GlobalConfig, PolicyFlags};
use crate::context::Context;
use crate::parent_segment_info::ParentSegmentInfo;
use crate::section_type::SectionType;
use crate::size::Size;
use crate::symbols::display::SymDisplaySettings;

use super::section_base::{SectionBase, SectionComparison};

#[cfg(feature = "std")]
use std::io;

pub trait Section {
    #[must_use]
    fn section_base(&self) -> &SectionBase;
    #[must_use]
    fn section_base_mut(&mut self) -> &mut SectionBase;

    #[must_use]
    fn symbol_count(&self) -> usize;

    /// The assembler text of every span of this section, without the
    /// prelude.
    fn disassemble(
        &self,
        context: &Context,
        settings: &SymDisplaySettings,
    ) -> Result<String, fmt::Error>;

    #[must_use]
    fn name(&self) -> &str {
        self.section_base().name()
    }

    #[must_use]
    fn vram_range(&self) -> &AddressRange<Vram> {
        self.section_base().vram_range()
    }

    #[must_use]
    fn size(&self) -> Size {
        self.vram_range().size()
    }

    #[must_use]
    fn section_type(&self) -> SectionType {
        self.section_base().section_type()
    }

    #[must_use]
    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        self.section_base().parent_segment_info()
    }

    #[must_use]
    fn symbols_vrams(&self) -> &BTreeSet<Vram> {
        self.section_base().symbols_vrams()
    }

    #[must_use]
    fn asm_prelude(&self, global_config: &GlobalConfig) -> String {
        self.section_base().asm_prelude(global_config)
    }

    #[must_use]
    fn hash_str(&self) -> String {
        self.section_base().hash_str()
    }

    #[must_use]
    fn compare_to(&self, other: &impl Section) -> SectionComparison {
        self.section_base().compare_to(other.section_base())
    }

    /// Normalize pointer-looking words for diffing. Gated by the
    /// `REMOVE_POINTERS` policy bit.
    fn remove_pointers(&mut self, global_config: &GlobalConfig) -> bool {
        if !global_config.policy().contains(PolicyFlags::REMOVE_POINTERS) {
            return false;
        }

        self.section_base_mut().remove_pointers_words()
    }

    /// Write the prelude plus the disassembly of every span.
    #[cfg(feature = "std")]
    fn disassemble_to_writer<W: io::Write>(
        &self,
        context: &Context,
        settings: &SymDisplaySettings,
        writer: &mut W,
    ) -> io::Result<()> {
        let global_config = context.global_config();

        let text = self
            .disassemble(context, settings)
            .map_err(|_| io::Error::other("Found a span with no symbol backing it"))?;

        writer.write_all(self.asm_prelude(global_config).as_bytes())?;
        writer.write_all(global_config.line_end().as_bytes())?;
        writer.write_all(text.as_bytes())?;

        Ok(())
    }

    /// Emit this section to `<filepath><suffix>.s`, plus the raw big-endian
    /// image at `<filepath><suffix>` when `WRITE_BINARY` is set. A `filepath`
    /// of `"-"` routes the text to stdout instead, which is shared and never
    /// closed here.
    ///
    /// Sections that produced no symbols emit nothing.
    #[cfg(feature = "std")]
    fn save_to_file(
        &self,
        context: &Context,
        settings: &SymDisplaySettings,
        filepath: &str,
    ) -> io::Result<()> {
        if self.symbol_count() == 0 {
            return Ok(());
        }

        if filepath == "-" {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            return self.disassemble_to_writer(context, settings, &mut handle);
        }

        let suffix = self.section_type().file_suffix();

        if context
            .global_config()
            .policy()
            .contains(PolicyFlags::WRITE_BINARY)
            && self.section_base().sizew() > 0
        {
            std::fs::write(
                alloc::format!("{}{}", filepath, suffix),
                self.section_base().be_bytes(),
            )?;
        }

        let mut file = std::fs::File::create(alloc::format!("{}{}.s", filepath, suffix))?;
        self.disassemble_to_writer(context, settings, &mut file)
    }
}
