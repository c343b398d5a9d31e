/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use rabbitizer::Vram;

use crate::{
    config::be_bytes_from_words,
    context::Context,
    metadata::{segment_metadata::FindSettings, GeneratedBy, SymbolMetadata, SymbolType},
    size::Size,
    str_decoding::escape_string,
    symbols::SymbolBase,
};

use super::SymDisplaySettings;

/// Renders a data or rodata span as assembler text.
#[derive(Debug, Copy, Clone)]
pub struct SymDataDisplay<'ctx, 'sym, 'flg> {
    context: &'ctx Context,
    sym: &'sym SymbolBase,
    settings: &'flg SymDisplaySettings,
}

impl<'ctx, 'sym, 'flg> SymDataDisplay<'ctx, 'sym, 'flg> {
    pub(crate) fn new(
        context: &'ctx Context,
        sym: &'sym SymbolBase,
        settings: &'flg SymDisplaySettings,
    ) -> Self {
        Self {
            context,
            sym,
            settings,
        }
    }
}

impl SymDataDisplay<'_, '_, '_> {
    fn comment_rom(&self, i: usize) -> crate::rom_address::RomAddress {
        self.sym.rom() + Size::new(i as u32 * 4) + self.sym.comment_offset()
    }

    /// Try to render the whole span as a '\0'-terminated string. Returns the
    /// amount of words consumed, or `None` if the contents don't actually
    /// decode as one.
    fn display_string(
        &self,
        f: &mut fmt::Formatter<'_>,
        line_end: &str,
    ) -> Result<Option<usize>, fmt::Error> {
        let bytes = be_bytes_from_words(self.sym.words());

        let raw_size = match self.sym.encoding().check_valid(&bytes) {
            Ok(raw_size) => raw_size,
            Err(_) => return Ok(None),
        };

        // The rest of the word holding the terminator must be padding.
        let covered = raw_size.next_multiple_of(4);
        if bytes[raw_size..covered].iter().any(|x| *x != 0) {
            return Ok(None);
        }

        let decoded = match self.sym.encoding().decode(&bytes[..raw_size - 1]) {
            Some(decoded) => decoded,
            None => return Ok(None),
        };

        self.settings
            .display_asm_comment(f, Some(self.comment_rom(0)), self.sym.vram(), None)?;
        write!(f, ".asciz \"{}\"{}", escape_string(&decoded), line_end)?;

        if raw_size % 4 != 0 {
            self.settings.display_indentation(f)?;
            write!(f, ".balign 4{}", line_end)?;
        }

        Ok(Some(covered / 4))
    }

    fn display_jumptable_word(
        &self,
        f: &mut fmt::Formatter<'_>,
        metadata: &SymbolMetadata,
        i: usize,
        word: u32,
    ) -> fmt::Result {
        let target_vram = match (metadata.is_got(), self.context.global_config().gp_config()) {
            (true, Some(gp_config)) => {
                // GOT-relative tables store signed displacements from `$gp`.
                Vram::new(gp_config.gp_value().inner().wrapping_add_signed(word as i32))
            }
            _ => Vram::new(word),
        };

        let label = self.context.find_symbol_from_any_segment(
            target_vram,
            self.sym.parent_segment_info(),
            FindSettings::new().with_allow_addend(false),
        );

        self.settings.display_asm_comment(
            f,
            Some(self.comment_rom(i)),
            self.sym.vram() + Size::new(i as u32 * 4),
            Some(word),
        )?;
        match label {
            Some(label) => write!(f, ".word {}", label.display_name()),
            None => write!(f, ".word 0x{:08X}", word),
        }
    }

    fn display_plain_word(
        &self,
        f: &mut fmt::Formatter<'_>,
        sym_type: Option<SymbolType>,
        i: usize,
        word: u32,
    ) -> fmt::Result {
        self.settings.display_asm_comment(
            f,
            Some(self.comment_rom(i)),
            self.sym.vram() + Size::new(i as u32 * 4),
            Some(word),
        )?;

        if word != 0 && sym_type.is_none_or(|x| x.can_reference_symbols()) {
            let word_vram = Vram::new(word);
            let reference = self.context.find_symbol_from_any_segment(
                word_vram,
                self.sym.parent_segment_info(),
                FindSettings::new(),
            );

            if let Some(reference) = reference {
                let referenceable = !reference.unknown_segment()
                    && (reference.is_defined()
                        || reference.generated_by() == GeneratedBy::UserDeclared);
                if referenceable {
                    let addend = (word_vram - reference.vram()).inner();
                    return if addend == 0 {
                        write!(f, ".word {}", reference.display_name())
                    } else {
                        write!(f, ".word {} + 0x{:X}", reference.display_name(), addend)
                    };
                }
            }
        }

        write!(f, ".word 0x{:08X}", word)
    }
}

impl fmt::Display for SymDataDisplay<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let global_config = self.context.global_config();
        let line_end = self.settings.line_end(global_config);

        let owned_segment = self
            .context
            .find_owned_segment(self.sym.parent_segment_info())?;
        let metadata = owned_segment
            .find_symbol(
                self.sym.vram(),
                FindSettings::new().with_allow_addend(false),
            )
            .ok_or(fmt::Error)?;

        let name = metadata.display_name();
        write!(f, ".globl {}{}", name, line_end)?;
        write!(f, "{}:{}", name, line_end)?;

        let sym_type = metadata.sym_type();
        let maybe_string = sym_type == Some(SymbolType::CString)
            || (sym_type.is_none() && metadata.is_maybe_string());

        let mut i = 0;
        if maybe_string {
            if let Some(words_consumed) = self.display_string(f, line_end)? {
                i = words_consumed;
            }
        }

        let words = self.sym.words();
        while i < words.len() {
            let word = words[i];

            if metadata.is_jumptable() {
                self.display_jumptable_word(f, metadata, i, word)?;
            } else if sym_type == Some(SymbolType::Float32) {
                let value = f32::from_bits(word);
                self.settings.display_asm_comment(
                    f,
                    Some(self.comment_rom(i)),
                    self.sym.vram() + Size::new(i as u32 * 4),
                    Some(word),
                )?;
                if value.is_finite() {
                    write!(f, ".float {:?}", value)?;
                } else {
                    write!(f, ".word 0x{:08X}", word)?;
                }
            } else if sym_type == Some(SymbolType::Float64) && i % 2 == 0 && i + 1 < words.len() {
                let dword = ((word as u64) << 32) | words[i + 1] as u64;
                let value = f64::from_bits(dword);
                self.settings.display_asm_comment(
                    f,
                    Some(self.comment_rom(i)),
                    self.sym.vram() + Size::new(i as u32 * 4),
                    Some(word),
                )?;
                if value.is_finite() {
                    write!(f, ".double {:?}", value)?;
                    write!(f, "{}", line_end)?;
                    i += 2;
                    continue;
                } else {
                    write!(f, ".word 0x{:08X}", word)?;
                }
            } else {
                self.display_plain_word(f, sym_type, i, word)?;
            }

            write!(f, "{}", line_end)?;
            i += 1;
        }

        Ok(())
    }
}
