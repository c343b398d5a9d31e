/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SectionType {
    Text = 1,
    Data,
    Rodata,
    Bss,
    Unknown,
}

impl SectionType {
    /// The assembler name used on `.section` directives.
    #[must_use]
    pub const fn section_name(&self) -> &'static str {
        match self {
            SectionType::Text => ".text",
            SectionType::Data => ".data",
            SectionType::Rodata => ".rodata",
            SectionType::Bss => ".bss",
            SectionType::Unknown => ".unknown",
        }
    }

    /// Suffix appended to output paths, one file per section kind.
    #[must_use]
    pub const fn file_suffix(&self) -> &'static str {
        self.section_name()
    }
}
