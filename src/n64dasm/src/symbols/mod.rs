/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

pub mod display;
mod symbol_base;
mod symbol_bss;
mod symbol_data;
mod symbol_rodata;
mod trait_symbol;

pub use symbol_base::SymbolBase;
pub use symbol_bss::SymbolBss;
pub use symbol_data::SymbolData;
pub use symbol_rodata::SymbolRodata;
pub use trait_symbol::{RomSymbol, Symbol};
