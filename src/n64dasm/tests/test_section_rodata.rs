/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use pretty_assertions::assert_eq;

use rabbitizer::{access_type::AccessType, Vram};

use n64dasm::{
    address_range::AddressRange,
    config::{Endian, GlobalConfig, GpConfig, GpValue},
    context::{Context, ContextBuilder},
    metadata::{FindSettings, SymbolType},
    parent_segment_info::ParentSegmentInfo,
    rom_address::RomAddress,
    rom_vram_range::RomVramRange,
    sections::SectionDataSettings,
};

fn global_ranges() -> RomVramRange {
    RomVramRange::new(
        AddressRange::new(RomAddress::new(0x0), RomAddress::new(0x100000)),
        AddressRange::new(Vram::new(0x80000000), Vram::new(0x80200000)),
    )
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

fn context_with_jumptable(global_config: GlobalConfig, is_got: bool) -> Context {
    let mut builder = ContextBuilder::new(global_config, global_ranges());
    {
        let mut global_segment = builder.global_segment();
        let jtbl = global_segment.add_jumptable(
            "jtbl_80000100".into(),
            Vram::new(0x80000100),
            Some(RomAddress::new(0x100)),
        );
        jtbl.set_got(is_got);
    }
    builder.process().build()
}

#[test]
fn jumptable_words_become_labels() {
    let mut context = context_with_jumptable(GlobalConfig::new(Endian::Big), false);
    let settings = SectionDataSettings::new();

    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &be_bytes(&[0x80000200, 0x80000210, 0x80000220, 0x00000000, 0x00000042]),
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    for label_vram in [0x80000200, 0x80000210, 0x80000220] {
        let label = context
            .global_segment()
            .find_symbol(
                Vram::new(label_vram),
                FindSettings::new().with_allow_addend(false),
            )
            .unwrap();
        assert_eq!(label.sym_type(), Some(SymbolType::JumptableLabel));
        assert_eq!(label.reference_counter(), 1);
    }

    // The zero word ends the table and stays inside its span; the non-zero
    // word that follows gets split into its own symbol.
    let offsets: Vec<usize> = section
        .rodata_symbols()
        .iter()
        .map(|sym| sym.in_file_offset())
        .collect();
    assert_eq!(offsets, [0, 16]);

    assert!(section.rodata_symbols()[0].is_jumptable(&context));
    assert!(!section.rodata_symbols()[1].is_jumptable(&context));
}

#[test]
fn got_jumptable_labels_are_gp_relative() {
    let global_config = GlobalConfig::new(Endian::Big)
        .with_gp_config(Some(GpConfig::new(GpValue::new(0x80100000))));
    let mut context = context_with_jumptable(global_config, true);
    let settings = SectionDataSettings::new();

    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &be_bytes(&[0xFFFFFF00, 0xFFFFFF80]),
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    for label_vram in [0x800FFF00, 0x800FFF80] {
        let label = context
            .global_segment()
            .find_symbol(
                Vram::new(label_vram),
                FindSettings::new().with_allow_addend(false),
            )
            .unwrap();
        assert_eq!(label.sym_type(), Some(SymbolType::JumptableLabel));
        assert_eq!(label.reference_counter(), 1);
    }
}

#[test]
fn label_on_unknown_segment_ends_the_table() {
    let mut context = context_with_jumptable(GlobalConfig::new(Endian::Big), false);
    let settings = SectionDataSettings::new();

    // 0x12345678 is not claimed by any segment.
    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &be_bytes(&[0x12345678, 0x00000007]),
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let label = context
        .unknown_segment()
        .find_symbol(
            Vram::new(0x12345678),
            FindSettings::new().with_allow_addend(false),
        )
        .unwrap();
    assert!(label.unknown_segment());
    assert_eq!(label.reference_counter(), 0);

    // The table degenerated into plain data, and the trailing non-zero word
    // still gets split off.
    let offsets: Vec<usize> = section
        .rodata_symbols()
        .iter()
        .map(|sym| sym.in_file_offset())
        .collect();
    assert_eq!(offsets, [0, 4]);
}

#[test]
fn late_rodata_to_normal_rodata_is_a_file_boundary() {
    let mut builder = ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges());
    {
        let mut global_segment = builder.global_segment();
        global_segment.add_jumptable(
            "jtbl_80000100".into(),
            Vram::new(0x80000100),
            Some(RomAddress::new(0x100)),
        );
        global_segment.add_symbol("gData".into(), Vram::new(0x80000110), None);
    }
    let mut context = builder.process().build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &be_bytes(&[
                0x80000200, 0x80000210, 0x80000220, 0x00000000, // the jumptable (late rodata)
                0x11111111, 0x22222222, 0x33333333, 0x44444444, // gData (normal rodata)
            ]),
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    assert_eq!(section.file_boundaries(), [16]);

    assert!(section.rodata_symbols()[0].is_late_rodata(&context));
    assert!(!section.rodata_symbols()[1].is_late_rodata(&context));
}

#[test]
fn extra_padding_is_a_file_boundary() {
    let mut builder = ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges());
    {
        let mut global_segment = builder.global_segment();
        global_segment.add_symbol("gFirst".into(), Vram::new(0x80000100), None);
        global_segment.add_symbol("gSecond".into(), Vram::new(0x80000110), None);
    }
    let mut context = builder.process().build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &be_bytes(&[
                0x00000001, 0x00000000, 0x00000000, 0x00000000, // gFirst, padded
                0x00000002, 0x00000000, 0x00000000, 0x00000000, // gSecond
            ]),
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    assert_eq!(section.file_boundaries(), [16]);
    assert_eq!(section.rodata_symbols()[0].count_extra_padding(&context), 3);
}

#[test]
fn double_after_scant_padding_is_not_a_boundary() {
    let mut builder = ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges());
    {
        let mut global_segment = builder.global_segment();
        global_segment.add_symbol("gFirst".into(), Vram::new(0x80000100), None);
        let dbl = global_segment.add_symbol("gHalf".into(), Vram::new(0x80000110), None);
        // The text analyzer saw this symbol accessed through `ldc1`.
        dbl.set_access_type_if_unset((AccessType::DOUBLEFLOAT, false));
    }
    let mut context = builder.process().build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &be_bytes(&[
                0x00000001, 0x00000002, 0x00000003, 0x00000000, // gFirst, one word of padding
                0x3FE00000, 0x00000000, 0x00000000, 0x00000000, // gHalf (0.5), padded
            ]),
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let metadata = context
        .global_segment()
        .find_symbol(
            Vram::new(0x80000110),
            FindSettings::new().with_allow_addend(false),
        )
        .unwrap();
    assert_eq!(metadata.user_declared_type(), None);
    assert_eq!(metadata.sym_type(), Some(SymbolType::Float64));

    assert!(section.rodata_symbols()[1].is_double(&context, 0));
    assert_eq!(section.rodata_symbols()[1].count_extra_padding(&context), 2);

    // A single word of padding before a double is just its own alignment,
    // not a file split.
    assert!(section.file_boundaries().is_empty());
}

#[test]
fn double_after_wide_padding_is_a_boundary() {
    let mut builder = ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges());
    {
        let mut global_segment = builder.global_segment();
        global_segment.add_symbol("gFirst".into(), Vram::new(0x80000100), None);
        let dbl = global_segment.add_symbol("gHalf".into(), Vram::new(0x80000110), None);
        dbl.set_access_type_if_unset((AccessType::DOUBLEFLOAT, false));
    }
    let mut context = builder.process().build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &be_bytes(&[
                0x00000001, 0x00000000, 0x00000000, 0x00000000, // gFirst, three words of padding
                0x3FE00000, 0x00000000, 0x00000000, 0x00000000, // gHalf (0.5), padded
            ]),
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    assert!(section.rodata_symbols()[1].is_double(&context, 0));
    assert_eq!(section.file_boundaries(), [16]);
}

#[test]
fn euc_jp_string_is_guessed_in_rodata() {
    let mut context = ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges())
        .process()
        .build();
    let settings = SectionDataSettings::new();

    // "テスト" in EUC-JP, '\0'-terminated and padded to a word boundary.
    let bytes = [0xA5, 0xC6, 0xA5, 0xB9, 0xA5, 0xC8, 0x00, 0x00];

    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &bytes,
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let metadata = context
        .global_segment()
        .find_symbol(
            Vram::new(0x80000100),
            FindSettings::new().with_allow_addend(false),
        )
        .unwrap();
    assert!(metadata.is_maybe_string());
}
