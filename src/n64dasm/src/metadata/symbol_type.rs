/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::config::Compiler;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum SymbolType {
    Function,
    BranchLabel,
    Jumptable,
    JumptableLabel,

    Byte,
    Short,
    Word,
    DWord,

    Float32,
    Float64,
    CString,

    UserCustom,
}

impl SymbolType {
    /// Whether the words of a symbol with this type may hold addresses of
    /// other symbols.
    pub fn can_reference_symbols(&self) -> bool {
        match self {
            SymbolType::Function | SymbolType::BranchLabel | SymbolType::JumptableLabel => false,
            SymbolType::Jumptable => true,
            SymbolType::Byte | SymbolType::Short => false,
            SymbolType::Word => true,
            SymbolType::DWord => false,
            SymbolType::Float32 | SymbolType::Float64 => false,
            SymbolType::CString => false,
            SymbolType::UserCustom => true,
        }
    }

    /// Late rodata is the chunk IDO emits after the main rodata of a file:
    /// jumptables plus the float and double literals of each function.
    pub(crate) fn is_late_rodata(&self, compiler: Compiler) -> bool {
        compiler.has_late_rodata()
            && matches!(
                self,
                SymbolType::Jumptable | SymbolType::Float32 | SymbolType::Float64
            )
    }
}
