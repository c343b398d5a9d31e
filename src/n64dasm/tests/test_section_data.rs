/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use pretty_assertions::assert_eq;

use rabbitizer::Vram;

use n64dasm::{
    address_range::AddressRange,
    config::{Endian, GlobalConfig, PolicyFlags},
    context::{Context, ContextBuilder},
    metadata::{FindSettings, GeneratedBy},
    parent_segment_info::ParentSegmentInfo,
    rom_address::RomAddress,
    rom_vram_range::RomVramRange,
    sections::{Section, SectionDataSettings},
    size::Size,
    symbols::Symbol,
};

fn make_context(global_config: GlobalConfig) -> Context {
    let global_ranges = RomVramRange::new(
        AddressRange::new(RomAddress::new(0x0), RomAddress::new(0x100000)),
        AddressRange::new(Vram::new(0x80000000), Vram::new(0x80200000)),
    );

    ContextBuilder::new(global_config, global_ranges)
        .process()
        .build()
}

fn segment_info() -> ParentSegmentInfo {
    ParentSegmentInfo::new(RomAddress::new(0x0), None)
}

fn be_bytes(words: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for word in words {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    bytes
}

#[test]
fn empty_section_produces_no_symbols() {
    let mut context = make_context(GlobalConfig::new(Endian::Big));
    let settings = SectionDataSettings::new();

    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &[],
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    assert_eq!(section.data_symbols().len(), 0);

    // The prelude must still be well-formed.
    let prelude = section.asm_prelude(context.global_config());
    assert!(prelude.starts_with(".include \"macro.inc\"\n"));
    assert!(prelude.contains(".section .data\n"));
    assert!(prelude.ends_with(".balign 16\n"));
}

#[test]
fn single_word_with_no_context_entry() {
    let mut context = make_context(GlobalConfig::new(Endian::Big));
    let settings = SectionDataSettings::new();

    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0xDEADBEEF]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    assert_eq!(section.data_symbols().len(), 1);
    assert_eq!(section.data_symbols()[0].in_file_offset(), 0);
    assert!(section.symbols_vrams().contains(&Vram::new(0x80100000)));

    let metadata = context
        .global_segment()
        .find_symbol(
            Vram::new(0x80100000),
            FindSettings::new().with_allow_addend(false),
        )
        .unwrap();
    assert!(metadata.is_defined());
    assert_eq!(metadata.generated_by(), GeneratedBy::Autogenerated);
}

#[test]
fn no_symbols_without_add_new_symbols_policy() {
    let global_config =
        GlobalConfig::new(Endian::Big).with_policy(PolicyFlags::empty());
    let mut context = make_context(global_config);
    let settings = SectionDataSettings::new();

    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0x11223344]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    assert_eq!(section.data_symbols().len(), 0);
}

#[test]
fn forward_reference_is_found_on_the_first_pass() {
    let mut context = make_context(GlobalConfig::new(Endian::Big));
    let settings = SectionDataSettings::new();

    // The first word points at the second one.
    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0x80100004, 0x00000000]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let offsets: Vec<usize> = section
        .data_symbols()
        .iter()
        .map(|sym| sym.in_file_offset())
        .collect();
    assert_eq!(offsets, [0, 4]);
}

#[test]
fn backward_reference_triggers_backfill_pass() {
    let mut context = make_context(GlobalConfig::new(Endian::Big));
    let settings = SectionDataSettings::new();

    // The third word points back at the second one, which the first pass has
    // already walked past by the time the pointer is noticed.
    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0x00000000, 0x00000000, 0x80100004, 0x00000000]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let offsets: Vec<usize> = section
        .data_symbols()
        .iter()
        .map(|sym| sym.in_file_offset())
        .collect();
    assert_eq!(offsets, [0, 4]);

    let metadata = context
        .global_segment()
        .find_symbol(
            Vram::new(0x80100004),
            FindSettings::new().with_allow_addend(false),
        )
        .unwrap();
    assert!(metadata.is_defined());
}

#[test]
fn analyzing_twice_reaches_a_fixpoint() {
    let mut context = make_context(GlobalConfig::new(Endian::Big));
    let settings = SectionDataSettings::new();

    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0x00000000, 0x00000000, 0x80100004, 0x00000000]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();

    section.analyze(&mut context).unwrap();
    let first_offsets: Vec<usize> = section
        .data_symbols()
        .iter()
        .map(|sym| sym.in_file_offset())
        .collect();
    let first_symbol_count = context.global_segment().symbols().len();

    section.analyze(&mut context).unwrap();
    let second_offsets: Vec<usize> = section
        .data_symbols()
        .iter()
        .map(|sym| sym.in_file_offset())
        .collect();

    assert_eq!(first_offsets, second_offsets);
    assert_eq!(first_symbol_count, context.global_segment().symbols().len());
}

#[test]
fn user_declared_size_synthesizes_an_auto_pad() {
    let global_config = GlobalConfig::new(Endian::Big);
    let global_ranges = RomVramRange::new(
        AddressRange::new(RomAddress::new(0x0), RomAddress::new(0x100000)),
        AddressRange::new(Vram::new(0x80000000), Vram::new(0x80200000)),
    );
    let mut builder = ContextBuilder::new(global_config, global_ranges);
    builder.global_segment().add_symbol_with_size(
        "gSomeTable".into(),
        Vram::new(0x80100000),
        Some(RomAddress::new(0x1000)),
        Size::new(8),
    );
    let mut context = builder.process().build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0x1, 0x2, 0x3, 0x4]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let offsets: Vec<usize> = section
        .data_symbols()
        .iter()
        .map(|sym| sym.in_file_offset())
        .collect();
    assert_eq!(offsets, [0, 8]);

    let pad = context
        .global_segment()
        .find_symbol(
            Vram::new(0x80100008),
            FindSettings::new().with_allow_addend(false),
        )
        .unwrap();
    assert!(pad.is_auto_created_pad());
    assert_eq!(pad.auto_created_pad_by(), Some(Vram::new(0x80100000)));

    assert_eq!(section.data_symbols()[0].size(), Size::new(8));
}

#[test]
fn word_referencing_a_known_symbol_bumps_its_reference_counter() {
    let global_config = GlobalConfig::new(Endian::Big);
    let global_ranges = RomVramRange::new(
        AddressRange::new(RomAddress::new(0x0), RomAddress::new(0x100000)),
        AddressRange::new(Vram::new(0x80000000), Vram::new(0x80200000)),
    );
    let mut builder = ContextBuilder::new(global_config, global_ranges);
    builder
        .global_segment()
        .add_symbol("gTarget".into(), Vram::new(0x80100010), None);
    let mut context = builder.process().build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0x80100010]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let target = context
        .global_segment()
        .find_symbol(
            Vram::new(0x80100010),
            FindSettings::new().with_allow_addend(false),
        )
        .unwrap();
    assert_eq!(target.reference_counter(), 1);
}

#[test]
fn pointer_to_an_unanalyzed_address_stays_queued() {
    let mut context = make_context(GlobalConfig::new(Endian::Big));
    let settings = SectionDataSettings::new();

    // Points into the global segment, but outside this section; nothing else
    // claims the address, so it stays on the pending queue.
    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0x80140000]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    assert_eq!(context.pending_pointers_in_data(), [Vram::new(0x80140000)]);
}
