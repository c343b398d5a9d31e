/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use crate::{context::Context, symbols::SymbolBss, symbols::Symbol};

use super::SymDisplaySettings;

/// Renders a bss span as a `.space` directive.
#[derive(Debug, Copy, Clone)]
pub struct SymBssDisplay<'ctx, 'sym, 'flg> {
    context: &'ctx Context,
    sym: &'sym SymbolBss,
    settings: &'flg SymDisplaySettings,
}

impl<'ctx, 'sym, 'flg> SymBssDisplay<'ctx, 'sym, 'flg> {
    pub(crate) fn new(
        context: &'ctx Context,
        sym: &'sym SymbolBss,
        settings: &'flg SymDisplaySettings,
    ) -> Self {
        Self {
            context,
            sym,
            settings,
        }
    }
}

impl fmt::Display for SymBssDisplay<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line_end = self.settings.line_end(self.context.global_config());

        let metadata = self.sym.find_own_metadata(self.context).ok_or(fmt::Error)?;

        let name = metadata.display_name();
        write!(f, ".globl {}{}", name, line_end)?;
        write!(f, "{}:{}", name, line_end)?;

        self.settings
            .display_asm_comment(f, None, self.sym.vram_range().start(), None)?;
        write!(f, ".space 0x{:X}{}", self.sym.size().inner(), line_end)?;

        Ok(())
    }
}
