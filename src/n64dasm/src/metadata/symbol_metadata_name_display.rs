/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use crate::section_type::SectionType;

use super::{SymbolMetadata, SymbolType};

fn should_escape_symbol(name: &str) -> bool {
    name.contains('@')
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, PartialOrd)]
#[must_use]
pub struct SymbolMetadataNameDisplay<'sym> {
    sym: &'sym SymbolMetadata,
}

impl<'sym> SymbolMetadataNameDisplay<'sym> {
    pub fn new(sym: &'sym SymbolMetadata) -> Self {
        Self { sym }
    }
}

impl SymbolMetadataNameDisplay<'_> {
    fn display_section_prefix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sym.sym_type() {
            Some(SymbolType::Function)
            | Some(SymbolType::BranchLabel)
            | Some(SymbolType::JumptableLabel)
            | Some(SymbolType::Jumptable) => {
                // Functions, labels and jumptables don't get a section prefix because most of the
                // time they are in their respective sections.
                // But if the section type is missing, then we haven't seen this symbol actually
                // defined anywhere, so we tell the user by using this prefix.
                match self.sym.section_type() {
                    Some(_) => Ok(()),
                    None => write!(f, "UNK_"),
                }
            }
            _ => match self.sym.section_type() {
                Some(SectionType::Text) => write!(f, "T_"),
                Some(SectionType::Data) => write!(f, "D_"),
                Some(SectionType::Rodata) => write!(f, "RO_"),
                Some(SectionType::Bss) => write!(f, "B_"),
                Some(SectionType::Unknown) | None => write!(f, "UNK_"),
            },
        }
    }

    fn display_type_prefix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sym.sym_type() {
            Some(SymbolType::Function) => write!(f, "func_"),
            Some(SymbolType::BranchLabel) | Some(SymbolType::JumptableLabel) => write!(f, ".L"),
            Some(SymbolType::Jumptable) => write!(f, "jtbl_"),

            Some(SymbolType::Byte)
            | Some(SymbolType::Short)
            | Some(SymbolType::Word)
            | Some(SymbolType::DWord)
            | Some(SymbolType::Float32)
            | Some(SymbolType::Float64)
            | Some(SymbolType::CString)
            | Some(SymbolType::UserCustom)
            | None => Ok(()),
        }
    }

    pub fn autogenerate_name(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_section_prefix(f)?;
        self.display_type_prefix(f)?;
        write!(f, "{}", self.sym.vram())
    }
}

impl fmt::Display for SymbolMetadataNameDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user_declared_name) = &self.sym.user_declared_name() {
            let should_escape = should_escape_symbol(user_declared_name);

            if should_escape {
                write!(f, "\"")?;
            }
            write!(f, "{}", user_declared_name)?;
            if should_escape {
                write!(f, "\"")?;
            }
            Ok(())
        } else {
            self.autogenerate_name(f)
        }
    }
}
