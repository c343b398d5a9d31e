/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod section_base;
mod section_bss;
mod section_creation_error;
mod section_data;
mod section_rodata;
mod trait_section;

pub use section_base::{SectionBase, SectionComparison};
pub use section_bss::{SectionBss, SectionBssSettings};
pub use section_creation_error::SectionCreationError;
pub use section_data::{SectionData, SectionDataSettings};
pub use section_rodata::SectionRodata;
pub use trait_section::Section;
