/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
pub extern crate rabbitizer;

pub mod address_range;
pub mod analysis;
pub mod parent_segment_info;
pub mod rom_address;
pub mod rom_vram_range;
pub mod section_type;
pub mod size;
pub mod str_decoding;

pub mod config;
pub mod context;
pub mod metadata;
pub mod sections;
pub mod symbols;
