/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod sym_bss_display;
mod sym_data_display;
mod sym_display_settings;

pub use sym_bss_display::SymBssDisplay;
pub use sym_data_display::SymDataDisplay;
pub use sym_display_settings::SymDisplaySettings;
