// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "integration test crate")]

use std::collections::BTreeSet;

use gamecode_opcodes::bitpattern::{BitPatternError, Bitmap, OpcodeMap, SlotBinding};
use gamecode_opcodes::emit::{EnumOptions, render_enum, render_table};
use gamecode_opcodes::families::convert::{
    ConvType, ConversionMode, body_for_mode, decode_label, generate_conversions, mode,
};
use gamecode_opcodes::families::extend::{Extend, Fill};
use gamecode_opcodes::families::swizzle::{self, Element};
use gamecode_opcodes::families::{InterpreterSyntax, PlainSyntax};
use gamecode_opcodes::group::{GroupTable, OpcodeTable, ResolveError};
use gamecode_opcodes::trace::{TraceMask, TraceSink};
use gamecode_opcodes::value_type::ValueType;
use gamecode_opcodes::{
    BuildError, DEFAULT_BITMAP, DEFAULT_GROUPS, MAIN_ADDRESS_WIDTH, build_default_table,
    build_table,
};

const GOLDEN_ENUM: &str = include_str!("../../gamecode_opcodes/golden/opcodes_enum.txt");
const GOLDEN_TABLE: &str = include_str!("../../gamecode_opcodes/golden/opcodes_table.txt");

fn default_map() -> OpcodeMap {
    let bitmap = Bitmap::parse(DEFAULT_BITMAP, MAIN_ADDRESS_WIDTH).unwrap();
    OpcodeMap::expand(&bitmap).unwrap()
}

#[test]
fn default_table_is_complete() {
    let map = default_map();
    assert_eq!(map.len(), 512);
    assert_eq!(map.spare_count(), 48);
    let table = build_default_table().unwrap();
    assert_eq!(table.len(), 512);
    assert_eq!(table.descriptors().count(), 464);
    assert_eq!(table.spare_count(), 48);
    for (slot, binding) in map.iter() {
        let spare = matches!(binding, SlotBinding::Spare { .. });
        assert_eq!(table.get(slot).is_none(), spare, "slot {slot:#05x}");
    }
}

#[test]
fn generation_is_deterministic() {
    let a = build_default_table().unwrap();
    let b = build_default_table().unwrap();
    assert_eq!(a, b);
    assert_eq!(
        render_enum(&a, EnumOptions { debug: true }),
        render_enum(&b, EnumOptions { debug: true })
    );
    assert_eq!(render_table(&a), render_table(&b));
}

#[test]
fn rendered_enum_matches_golden() {
    let table = build_default_table().unwrap();
    assert_eq!(render_enum(&table, EnumOptions::default()), GOLDEN_ENUM);
}

#[test]
fn rendered_table_matches_golden() {
    let table = build_default_table().unwrap();
    assert_eq!(render_table(&table), GOLDEN_TABLE);
}

#[test]
fn debug_enum_prefixes_every_row() {
    let table = build_default_table().unwrap();
    let text = render_enum(&table, EnumOptions { debug: true });
    for ((n, line), golden) in text.lines().enumerate().zip(GOLDEN_ENUM.lines()) {
        let expected = format!("{:03x} {golden}", n * 4);
        assert_eq!(line, expected);
    }
    assert_eq!(text.lines().count(), 128);
}

#[test]
fn wrong_width_rows_are_rejected() {
    let err = Bitmap::parse("0 0000 mmss load\n0 0001 mms store\n", 9).unwrap_err();
    assert!(matches!(err, BitPatternError::AtLine { line: 2, .. }), "{err}");
    let err = build_table("0 0000 mmsss load\n", DEFAULT_GROUPS, 9).unwrap_err();
    assert!(matches!(err, BuildError::Bitmap(_)));
}

#[test]
fn all_wildcard_row_round_trips() {
    for width in [1_u32, 4, 9, 12] {
        let pattern: String = std::iter::repeat_n('n', width as usize).collect();
        let mut bitmap = Bitmap::new(width).unwrap();
        bitmap.push(&pattern, Some("all")).unwrap();
        let map = OpcodeMap::expand(&bitmap).unwrap();
        assert_eq!(map.len(), 1 << width);
        for (slot, binding) in map.iter() {
            let SlotBinding::Group(binding) = binding else {
                panic!("slot {slot} is spare");
            };
            assert_eq!(&*binding.group, "all");
            assert_eq!(binding.params.len(), 1);
            assert_eq!(binding.get(&pattern), Some(slot));
        }
    }
}

#[test]
fn load_row_binds_and_resolves_slot_zero() {
    let map = default_map();
    let Some(SlotBinding::Group(binding)) = map.get(0) else {
        panic!("slot 0 is not bound");
    };
    assert_eq!(&*binding.group, "load");
    assert_eq!(binding.get("mm"), Some(0));
    assert_eq!(binding.get("ss"), Some(0));

    let groups = GroupTable::from_json(DEFAULT_GROUPS).unwrap();
    let d = groups
        .get("load")
        .unwrap()
        .describe(&binding.params)
        .unwrap();
    assert_eq!(d.widths, [0, 0, 1]);
    assert_eq!(d.symbol, "OP_LOAD_E_1");
    assert_eq!(d.types, [ValueType::Void; 3]);
}

#[test]
fn later_rows_override_earlier_rows() {
    #[derive(Default)]
    struct Overwrites(Vec<(u32, usize, usize)>);

    impl TraceSink for Overwrites {
        fn mask(&self) -> TraceMask {
            TraceMask::OVERWRITE
        }

        fn slot_overwrite(
            &mut self,
            slot: u32,
            previous_line: usize,
            row: &gamecode_opcodes::bitpattern::Row,
        ) {
            self.0.push((slot, previous_line, row.line));
        }
    }

    let bitmap = Bitmap::parse(DEFAULT_BITMAP, MAIN_ADDRESS_WIDTH).unwrap();
    let mut sink = Overwrites::default();
    let mask = sink.mask();
    let map = OpcodeMap::expand_traced(&bitmap, mask, Some(&mut sink)).unwrap();
    assert_eq!(map, default_map());
    assert!(!sink.0.is_empty());
    for &(slot, previous, line) in &sink.0 {
        assert!(previous < line);
        let SlotBinding::Group(b) = map.get(slot).unwrap() else {
            continue;
        };
        assert!(b.line >= line);
    }
}

#[test]
fn unknown_group_names_the_slot() {
    let err = build_table("nn\n01 nosuch\n", DEFAULT_GROUPS, 2).unwrap_err();
    assert_eq!(
        err,
        BuildError::Resolve(ResolveError::UnknownGroup {
            slot: 1,
            line: 2,
            group: "nosuch".into(),
        })
    );
}

#[test]
fn conversion_coverage() {
    let cases = generate_conversions(&InterpreterSyntax);
    let mut seen = BTreeSet::new();
    for case in &cases {
        assert!(seen.insert(case.code), "duplicate label {}", case.label);
    }
    let mut expected = BTreeSet::new();
    for width in 1..=4_u32 {
        for src in ConvType::ALL {
            for dst in ConvType::ALL {
                if mode(src, dst) != ConversionMode::Illegal {
                    expected.insert(((width - 1) << 6) | (src.code() << 3) | dst.code());
                }
            }
        }
    }
    assert_eq!(seen, expected);
    for code in seen {
        let (width, src, dst) = decode_label(code).unwrap();
        assert!((1..=4).contains(&width));
        assert_ne!(src, dst);
    }
    // No unsigned float can be named.
    assert!(
        ConvType::ALL
            .iter()
            .all(|t| !(t.code() & 4 != 0 && t.is_float()))
    );
}

#[test]
fn scalar_bool_coerce_emits_truth_test() {
    let body = body_for_mode(
        &PlainSyntax,
        ConversionMode::BoolCoerce,
        1,
        ConvType::Int,
        ConvType::Float,
    );
    assert_eq!(body.as_deref(), Some("dst = !!src;"));
}

#[test]
fn extend_one_fill() {
    let ext = Extend::new(0, Fill::One, false, false).unwrap();
    assert!(ext.body(&PlainSyntax).contains("{ src, 0x3f800000 }"));
    let ext = Extend::new(0, Fill::One, false, true).unwrap();
    assert!(ext.body(&PlainSyntax).contains("{ 0x3f800000, src }"));
}

#[test]
fn swizzle_bijection() {
    let dispatch = swizzle::generate_dispatch(&InterpreterSyntax, Element::Float);
    let labels: Vec<&str> = dispatch
        .lines()
        .filter_map(|l| l.strip_prefix("\t&&swizzle_f_")?.strip_suffix(','))
        .collect();
    assert_eq!(labels.len(), 256);
    let mut tuples = BTreeSet::new();
    for (index, label) in labels.iter().enumerate() {
        let perm = swizzle::decode_label(label).unwrap();
        assert_eq!(usize::from(perm), index);
        let [i, j, k, l] = swizzle::unpack(perm);
        assert_eq!(swizzle::pack(i, j, k, l), perm);
        assert!(tuples.insert((i, j, k, l)));
        assert!(dispatch.contains(&format!("\nswizzle_f_{label}: ")));
    }
    assert_eq!(tuples.len(), 256);
}

#[test]
fn swizzle_xyzw_reverses_canonical_input() {
    let perm = swizzle::pack(0, 1, 2, 3);
    assert_eq!(swizzle::label(perm), "xyzw");
    let word = swizzle::word(perm, 0, 0);
    assert_eq!(swizzle::apply(word, [1, 2, 3, 4]), [4, 3, 2, 1]);

    let fixtures = swizzle::generate_fixtures();
    assert!(fixtures.contains(&format!(
        "\t{{ OP(0, 0, 0, OP_SWIZZLE_F), 0, {word:#06x}, {} }},\n",
        (usize::from(perm) + 1) * 4
    )));
}

#[test]
fn swizzle_fixture_opcodes_exist() {
    let table = build_default_table().unwrap();
    for element in Element::ALL {
        assert!(table.find(element.opcode()).is_some(), "{}", element.opcode());
    }
}

#[test]
fn embedded_groups_all_load() {
    let groups = GroupTable::from_json(DEFAULT_GROUPS).unwrap();
    let map = default_map();
    let used: BTreeSet<&str> = map
        .iter()
        .filter_map(|(_, b)| match b {
            SlotBinding::Group(g) => Some(&*g.group),
            SlotBinding::Spare { .. } => None,
        })
        .collect();
    for name in used {
        assert!(groups.get(name).is_some(), "{name}");
    }
    let table = OpcodeTable::resolve(&map, &groups).unwrap();
    let (_, with) = table.find("OP_WITH").unwrap();
    assert_eq!(with.mnemonic, "with");
}
