/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use rabbitizer::Vram;

use crate::{
    config::{GlobalConfig, LineEnds},
    rom_address::RomAddress,
};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct SymDisplaySettings {
    line_end: Option<LineEnds>,

    emit_asm_comment: bool,

    asm_indentation: u8,
}

impl SymDisplaySettings {
    pub const fn new() -> Self {
        Self {
            line_end: None,
            emit_asm_comment: true,
            asm_indentation: 4,
        }
    }

    pub const fn with_line_end(self, line_end: Option<LineEnds>) -> Self {
        Self { line_end, ..self }
    }
    pub const fn with_emit_asm_comment(self, emit_asm_comment: bool) -> Self {
        Self {
            emit_asm_comment,
            ..self
        }
    }
    pub const fn with_asm_indentation(self, asm_indentation: u8) -> Self {
        Self {
            asm_indentation,
            ..self
        }
    }

    /// The line terminator, falling back to the process-wide setting.
    pub fn line_end(&self, global_config: &GlobalConfig) -> &'static str {
        match self.line_end {
            Some(line_end) => line_end.as_str(),
            None => global_config.line_end(),
        }
    }
}

impl Default for SymDisplaySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SymDisplaySettings {
    pub(crate) fn display_indentation(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.asm_indentation > 0 {
            write!(f, "{:width$}", " ", width = self.asm_indentation as usize)?;
        }
        Ok(())
    }

    pub(crate) fn display_asm_comment(
        &self,
        f: &mut fmt::Formatter<'_>,
        rom: Option<RomAddress>,
        vram: Vram,
        word: Option<u32>,
    ) -> fmt::Result {
        self.display_indentation(f)?;

        if !self.emit_asm_comment {
            return Ok(());
        }

        write!(f, "/* ")?;
        if let Some(rom) = rom {
            write!(f, "{} ", rom)?;
        }
        write!(f, "{} ", vram)?;
        if let Some(word) = word {
            write!(f, "{:08X} ", word)?;
        }

        write!(f, "*/ ")
    }
}
