/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use bitflags::bitflags;

bitflags! {
    /// Toggleable behaviors of the disassembler.
    #[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
    pub struct PolicyFlags: u32 {
        /// Allow creating brand new autogenerated symbols, including the
        /// anchor symbol at the start of each analyzed section.
        const ADD_NEW_SYMBOLS = 1 << 0;
        /// Honor user-declared sizes on data symbols by synthesizing a pad
        /// symbol right past the declared end.
        const CREATE_DATA_PADS = 1 << 1;
        /// Same as `CREATE_DATA_PADS`, for rodata sections.
        const CREATE_RODATA_PADS = 1 << 2;
        /// Allow `remove_pointers` to zero out the low bytes of
        /// pointer-looking words, making two builds byte-comparable.
        const REMOVE_POINTERS = 1 << 3;
        /// Emit the raw big-endian section image next to the assembly file.
        const WRITE_BINARY = 1 << 4;
    }
}

impl Default for PolicyFlags {
    fn default() -> Self {
        PolicyFlags::ADD_NEW_SYMBOLS
            | PolicyFlags::CREATE_DATA_PADS
            | PolicyFlags::CREATE_RODATA_PADS
    }
}
