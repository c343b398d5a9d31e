/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use pretty_assertions::assert_eq;

use rabbitizer::{access_type::AccessType, Vram};

use n64dasm::{
    address_range::AddressRange,
    config::{Endian, GlobalConfig},
    context::{Context, ContextBuilder},
    metadata::{FindSettings, SymbolType},
    parent_segment_info::ParentSegmentInfo,
    rom_address::RomAddress,
    rom_vram_range::RomVramRange,
    sections::{Section, SectionBssSettings, SectionDataSettings},
    symbols::display::SymDisplaySettings,
};

fn global_ranges() -> RomVramRange {
    RomVramRange::new(
        AddressRange::new(RomAddress::new(0x0), RomAddress::new(0x100000)),
        AddressRange::new(Vram::new(0x80000000), Vram::new(0x80200000)),
    )
}

fn make_context() -> Context {
    ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges())
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
fn plain_words_and_symbol_references() {
    let mut builder = ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges());
    builder
        .global_segment()
        .add_symbol("gFoo".into(), Vram::new(0x80100004), None);
    let mut context = builder.process().build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0x80100004, 0x12345678]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let text = section
        .disassemble(&context, &SymDisplaySettings::new())
        .unwrap();

    assert!(text.contains(".globl D_80100000\n"));
    assert!(text.contains("D_80100000:\n"));
    // The first word points at `gFoo`, so it is emitted by name.
    assert!(text.contains(".word gFoo\n"));
    assert!(text.contains(".globl gFoo\n"));
    assert!(text.contains(".word 0x12345678\n"));
}

#[test]
fn guessed_string_is_emitted_as_asciz() {
    let mut context = make_context();
    let settings = SectionDataSettings::new();

    let mut raw_bytes = b"hello world!\0".to_vec();
    raw_bytes.resize(16, 0);

    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &raw_bytes,
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let text = section
        .disassemble(&context, &SymDisplaySettings::new())
        .unwrap();

    assert!(text.contains(".asciz \"hello world!\""));
    assert!(text.contains(".balign 4"));
}

#[test]
fn jumptable_entries_are_emitted_by_label_name() {
    let mut builder = ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges());
    builder.global_segment().add_jumptable(
        "jtbl_80000100".into(),
        Vram::new(0x80000100),
        Some(RomAddress::new(0x100)),
    );
    let mut context = builder.process().build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &be_bytes(&[0x80000200, 0x80000210, 0x00000000]),
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let text = section
        .disassemble(&context, &SymDisplaySettings::new())
        .unwrap();

    assert!(text.contains(".globl jtbl_80000100\n"));
    assert!(text.contains(".word .L80000200\n"));
    assert!(text.contains(".word .L80000210\n"));
    assert!(text.contains(".word 0x00000000\n"));
}

#[test]
fn floats_and_doubles_use_their_directives() {
    // No user-declared types here: the scalar types come from the access
    // types the text analyzer would have recorded while walking `lwc1` and
    // `ldc1` instructions.
    let mut builder = ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges());
    {
        let mut global_segment = builder.global_segment();
        let flt = global_segment.add_symbol("gPi".into(), Vram::new(0x80000100), None);
        flt.set_access_type_if_unset((AccessType::FLOAT, false));
        let dbl = global_segment.add_symbol("gOne".into(), Vram::new(0x80000104), None);
        dbl.set_access_type_if_unset((AccessType::DOUBLEFLOAT, false));
    }
    let mut context = builder.process().build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_rodata(
            &settings,
            ".rodata".into(),
            &be_bytes(&[0x40490FDB, 0x3FF00000, 0x00000000]),
            RomAddress::new(0x100),
            Vram::new(0x80000100),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let metadata = context
        .global_segment()
        .find_symbol(
            Vram::new(0x80000104),
            FindSettings::new().with_allow_addend(false),
        )
        .unwrap();
    assert_eq!(metadata.user_declared_type(), None);
    assert_eq!(metadata.sym_type(), Some(SymbolType::Float64));

    let text = section
        .disassemble(&context, &SymDisplaySettings::new())
        .unwrap();

    assert!(text.contains(".float 3.1415927\n"));
    assert!(text.contains(".double 1.0\n"));
}

#[test]
fn bss_section_emits_space_directives() {
    let mut builder = ContextBuilder::new(GlobalConfig::new(Endian::Big), global_ranges());
    builder
        .global_segment()
        .add_symbol("gBuffer".into(), Vram::new(0x80180008), None);
    let mut context = builder.process().build();

    let settings = SectionBssSettings::new();
    let mut section = context
        .create_section_bss(
            &settings,
            ".bss".into(),
            AddressRange::new(Vram::new(0x80180000), Vram::new(0x80180010)),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    assert_eq!(section.bss_symbols().len(), 2);

    let text = section
        .disassemble(&context, &SymDisplaySettings::new())
        .unwrap();

    assert!(text.contains(".globl B_80180000\n"));
    assert!(text.contains(".globl gBuffer\n"));
    assert_eq!(text.matches(".space 0x8").count(), 2);

    let prelude = section.asm_prelude(context.global_config());
    assert!(prelude.contains(".section .bss\n"));
}

#[cfg(feature = "std")]
#[test]
fn save_to_file_writes_the_section() {
    use n64dasm::config::PolicyFlags;

    let global_config = GlobalConfig::new(Endian::Big)
        .with_policy(PolicyFlags::default() | PolicyFlags::WRITE_BINARY);
    let mut context = ContextBuilder::new(global_config, global_ranges())
        .process()
        .build();

    let settings = SectionDataSettings::new();
    let mut section = context
        .create_section_data(
            &settings,
            ".data".into(),
            &be_bytes(&[0x12345678]),
            RomAddress::new(0x1000),
            Vram::new(0x80100000),
            segment_info(),
        )
        .unwrap();
    section.analyze(&mut context).unwrap();

    let dir = std::env::temp_dir().join("n64dasm_save_to_file_test");
    std::fs::create_dir_all(&dir).unwrap();
    let filepath = dir.join("dummy");
    let filepath = filepath.to_str().unwrap();

    section
        .save_to_file(&context, &SymDisplaySettings::new(), filepath)
        .unwrap();

    let asm = std::fs::read_to_string(format!("{}.data.s", filepath)).unwrap();
    assert!(asm.starts_with(".include \"macro.inc\"\n"));
    assert!(asm.contains(".word 0x12345678\n"));

    let binary = std::fs::read(format!("{}.data", filepath)).unwrap();
    assert_eq!(binary, [0x12, 0x34, 0x56, 0x78]);

    std::fs::remove_dir_all(&dir).unwrap();
}
