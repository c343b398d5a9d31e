/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::section_type::SectionType;

use super::{Compiler, Endian, GpConfig, PolicyFlags};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum LineEnds {
    Unix,
    Dos,
}

impl LineEnds {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineEnds::Unix => "\n",
            LineEnds::Dos => "\r\n",
        }
    }
}

/// Process-wide knobs, threaded explicitly instead of living on a global.
///
/// The value is moved into the [`Context`] at build time and reached through
/// it from then on, so every analysis of a given Context sees the same
/// configuration.
///
/// [`Context`]: crate::context::Context
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct GlobalConfig {
    endian: Endian,
    endian_data: Option<Endian>,
    endian_rodata: Option<Endian>,
    gp_config: Option<GpConfig>,
    compiler: Compiler,
    policy: PolicyFlags,
    line_ends: LineEnds,
}

impl GlobalConfig {
    pub fn new(endian: Endian) -> Self {
        Self {
            endian,
            endian_data: None,
            endian_rodata: None,
            gp_config: None,
            compiler: Compiler::IDO,
            policy: PolicyFlags::default(),
            line_ends: LineEnds::Unix,
        }
    }
}

impl GlobalConfig {
    pub const fn endian(&self) -> Endian {
        self.endian
    }
    pub const fn with_endian(self, endian: Endian) -> Self {
        Self { endian, ..self }
    }

    pub const fn endian_data(&self) -> Option<Endian> {
        self.endian_data
    }
    pub const fn with_endian_data(self, endian_data: Option<Endian>) -> Self {
        Self {
            endian_data,
            ..self
        }
    }

    pub const fn endian_rodata(&self) -> Option<Endian> {
        self.endian_rodata
    }
    pub const fn with_endian_rodata(self, endian_rodata: Option<Endian>) -> Self {
        Self {
            endian_rodata,
            ..self
        }
    }

    /// The endianness used to decode the words of a section, honoring the
    /// per-kind overrides.
    pub fn endian_for_section(&self, section_type: SectionType) -> Endian {
        let specific = match section_type {
            SectionType::Data => self.endian_data,
            SectionType::Rodata => self.endian_rodata,
            _ => None,
        };
        specific.unwrap_or(self.endian)
    }

    pub const fn gp_config(&self) -> Option<GpConfig> {
        self.gp_config
    }
    pub const fn with_gp_config(self, gp_config: Option<GpConfig>) -> Self {
        Self { gp_config, ..self }
    }

    pub const fn compiler(&self) -> Compiler {
        self.compiler
    }
    pub const fn with_compiler(self, compiler: Compiler) -> Self {
        Self { compiler, ..self }
    }

    pub const fn policy(&self) -> PolicyFlags {
        self.policy
    }
    pub const fn with_policy(self, policy: PolicyFlags) -> Self {
        Self { policy, ..self }
    }

    pub const fn line_ends(&self) -> LineEnds {
        self.line_ends
    }
    pub const fn with_line_ends(self, line_ends: LineEnds) -> Self {
        Self { line_ends, ..self }
    }
    pub const fn line_end(&self) -> &'static str {
        self.line_ends.as_str()
    }
}
