// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `swizzle` instruction: 4-component permutation, negation and zeroing.
//!
//! The immediate word packs three fields:
//!
//! ```text
//!  15    12 11     8 7            0
//! +--------+--------+--------------+
//! |  zero  | negate |  i j k l     |
//! +--------+--------+--------------+
//! ```
//!
//! The permutation byte is `i*64 + j*16 + k*4 + l`. Destination `x`, `y`, `z`,
//! `w` read source components `l`, `k`, `j`, `i`. Negation is applied after
//! the permutation and zeroing after negation. The dispatch table and the test
//! fixtures both go through [`pack`] and [`unpack`].

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;
use core::ops::Neg;

use super::{Operand, OperandSyntax, vector_type};

/// Component names, indexed by component.
pub const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];

/// Permutation that leaves every component in place.
pub const IDENTITY: u8 = pack(3, 2, 1, 0);

/// Packs a component tuple into a permutation byte.
#[must_use]
pub const fn pack(i: u8, j: u8, k: u8, l: u8) -> u8 {
    (i & 3) * 64 + (j & 3) * 16 + (k & 3) * 4 + (l & 3)
}

/// Unpacks a permutation byte into `[i, j, k, l]`.
#[must_use]
pub const fn unpack(perm: u8) -> [u8; 4] {
    [perm >> 6, (perm >> 4) & 3, (perm >> 2) & 3, perm & 3]
}

/// Label naming a permutation: `xyzw[i] xyzw[j] xyzw[k] xyzw[l]`.
#[must_use]
pub fn label(perm: u8) -> String {
    unpack(perm)
        .into_iter()
        .map(|c| COMPONENTS[c as usize])
        .collect()
}

/// Decodes a four-letter label back into its permutation byte.
#[must_use]
pub fn decode_label(label: &str) -> Option<u8> {
    let mut perm = 0;
    let mut count = 0;
    for ch in label.chars() {
        if count == 4 {
            return None;
        }
        let c = COMPONENTS.iter().position(|&n| n == ch)?;
        perm = perm * 4 + c as u8;
        count += 1;
    }
    (count == 4).then_some(perm)
}

/// Builds the immediate word.
#[must_use]
pub const fn word(perm: u8, negate: u8, zero: u8) -> u16 {
    perm as u16 | ((negate & 0xf) as u16) << 8 | ((zero & 0xf) as u16) << 12
}

/// Applies an immediate word to `input`.
pub fn apply<T: Copy + Default + Neg<Output = T>>(word: u16, input: [T; 4]) -> [T; 4] {
    let [i, j, k, l] = unpack(word as u8);
    let mut out = [
        input[l as usize],
        input[k as usize],
        input[j as usize],
        input[i as usize],
    ];
    let negate = (word >> 8) & 0xf;
    let zero = (word >> 12) & 0xf;
    for (c, v) in out.iter_mut().enumerate() {
        if negate & (1 << c) != 0 {
            *v = -*v;
        }
        if zero & (1 << c) != 0 {
            *v = T::default();
        }
    }
    out
}

/// Element type of the swizzled vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Element {
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
}

impl Element {
    /// Both element types.
    pub const ALL: [Self; 2] = [Self::Float, Self::Double];

    /// Lower-case suffix used in C identifiers.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Float => "f",
            Self::Double => "d",
        }
    }

    /// Opcode symbol of the instruction.
    #[must_use]
    pub const fn opcode(self) -> &'static str {
        match self {
            Self::Float => "OP_SWIZZLE_F",
            Self::Double => "OP_SWIZZLE_D",
        }
    }

    /// Operand view of the whole vector.
    #[must_use]
    pub const fn view(self) -> &'static str {
        match self {
            Self::Float => "vec4",
            Self::Double => "dvec4",
        }
    }

    /// Globals occupied by one vector.
    #[must_use]
    pub const fn globals(self) -> u32 {
        match self {
            Self::Float => 4,
            Self::Double => 8,
        }
    }
}

/// Renders the computed-goto table and the 256 labeled permutation bodies.
pub fn generate_dispatch(syntax: &impl OperandSyntax, element: Element) -> String {
    let s = element.suffix();
    let view = element.view();
    let dst = syntax.operand(Operand::C, view);
    let src = syntax.operand(Operand::A, view);

    let mut out = String::new();
    let _ = writeln!(out, "static void *swizzle_{s}_table[256] = {{");
    for perm in 0..=255 {
        let _ = writeln!(out, "\t&&swizzle_{s}_{},", label(perm));
    }
    out.push_str("};\n");
    for perm in 0..=255 {
        let [i, j, k, l] = unpack(perm);
        let _ = writeln!(
            out,
            "swizzle_{s}_{}: {dst} = ({}) {{ {src}[{l}], {src}[{k}], {src}[{j}], {src}[{i}] }}; goto swizzle_{s}_done;",
            label(perm),
            vector_type(view),
        );
    }
    tracing::debug!(element = s, "generated swizzle dispatch");
    out
}

/// Input vector used by every fixture.
pub const FIXTURE_INPUT: [i32; 4] = [1, 2, 3, 4];

/// One fixture scenario: a named list of immediate words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    /// Scenario name.
    pub name: &'static str,
    /// One instruction per word.
    pub words: Vec<u16>,
}

/// The three fixture scenarios: every permutation, every negation mask and
/// every zero mask.
#[must_use]
pub fn scenarios() -> [Scenario; 3] {
    [
        Scenario {
            name: "permute",
            words: (0..=255).map(|p| word(p, 0, 0)).collect(),
        },
        Scenario {
            name: "negate",
            words: (0..16).map(|m| word(IDENTITY, m, 0)).collect(),
        },
        Scenario {
            name: "zero",
            words: (0..16).map(|m| word(IDENTITY, 0, m)).collect(),
        },
    ]
}

fn vec_row(out: &mut String, v: [i32; 4]) {
    let _ = writeln!(out, "\t{{{}, {}, {}, {}}},", v[0], v[1], v[2], v[3]);
}

fn render_scenario(out: &mut String, element: Element, scenario: &Scenario) {
    let name = format!("swizzle_{}_{}", element.suffix(), scenario.name);
    let ty = vector_type(element.view());

    let _ = writeln!(out, "static {ty} {name}_init[] = {{");
    vec_row(out, FIXTURE_INPUT);
    for _ in &scenario.words {
        vec_row(out, [0; 4]);
    }
    out.push_str("};\n\n");

    let _ = writeln!(out, "static {ty} {name}_expect[] = {{");
    vec_row(out, FIXTURE_INPUT);
    for &w in &scenario.words {
        vec_row(out, apply(w, FIXTURE_INPUT));
    }
    out.push_str("};\n\n");

    let _ = writeln!(out, "static dstatement_t {name}_statements[] = {{");
    for (n, &w) in scenario.words.iter().enumerate() {
        let disp = (n as u32 + 1) * element.globals();
        let _ = writeln!(
            out,
            "\t{{ OP(0, 0, 0, {}), 0, {w:#06x}, {disp} }},",
            element.opcode()
        );
    }
    out.push_str("};\n\n");
}

fn render_test_entry(out: &mut String, element: Element, scenario: &Scenario) {
    let name = format!("swizzle_{}_{}", element.suffix(), scenario.name);
    out.push_str("\t{\n");
    let _ = writeln!(
        out,
        "\t\t.desc = \"swizzle {} {}\",",
        element.suffix(),
        scenario.name
    );
    let _ = writeln!(
        out,
        "\t\t.num_globals = {}*num_globals({name}_init,{name}_expect),",
        element.globals()
    );
    let _ = writeln!(
        out,
        "\t\t.num_statements = num_statements ({name}_statements),"
    );
    let _ = writeln!(out, "\t\t.statements = {name}_statements,");
    let _ = writeln!(out, "\t\t.init_globals = (pr_int_t *) {name}_init,");
    let _ = writeln!(out, "\t\t.expect_globals = (pr_int_t *) {name}_expect,");
    out.push_str("\t},\n");
}

/// Renders the self-contained fixture source for both element types.
#[must_use]
pub fn generate_fixtures() -> String {
    let scenarios = scenarios();
    let mut out = String::from("#include \"head.c\"\n\n");
    for element in Element::ALL {
        for scenario in &scenarios {
            render_scenario(&mut out, element, scenario);
        }
    }
    out.push_str("test_t tests[] = {\n");
    for element in Element::ALL {
        for scenario in &scenarios {
            render_test_entry(&mut out, element, scenario);
        }
    }
    out.push_str("};\n\n#include \"main.c\"\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::families::{InterpreterSyntax, PlainSyntax};

    #[test]
    fn pack_round_trips() {
        for perm in 0..=255_u8 {
            let [i, j, k, l] = unpack(perm);
            assert_eq!(pack(i, j, k, l), perm);
            assert_eq!(decode_label(&label(perm)), Some(perm));
        }
        assert_eq!(IDENTITY, 0xe4);
        assert_eq!(label(IDENTITY), "wzyx");
        assert_eq!(decode_label("xyz"), None);
        assert_eq!(decode_label("xyzwx"), None);
        assert_eq!(decode_label("xyzq"), None);
    }

    #[test]
    fn xyzw_reverses_the_input() {
        let perm = pack(0, 1, 2, 3);
        assert_eq!(label(perm), "xyzw");
        assert_eq!(apply(word(perm, 0, 0), [1, 2, 3, 4]), [4, 3, 2, 1]);
        assert_eq!(apply(word(IDENTITY, 0, 0), [1, 2, 3, 4]), [1, 2, 3, 4]);
    }

    #[test]
    fn negate_then_zero() {
        assert_eq!(apply(word(IDENTITY, 0b0101, 0), [1, 2, 3, 4]), [-1, 2, -3, 4]);
        assert_eq!(
            apply(word(IDENTITY, 0b1111, 0b1000), [1.0, 2.0, 3.0, 4.0]),
            [-1.0, -2.0, -3.0, 0.0]
        );
        assert_eq!(word(0x1b, 0x5, 0xa), 0xa51b);
    }

    #[test]
    fn dispatch_table_and_bodies_agree() {
        let text = generate_dispatch(&PlainSyntax, Element::Float);
        assert!(text.starts_with("static void *swizzle_f_table[256] = {\n\t&&swizzle_f_xxxx,\n"));
        assert!(text.contains(
            "swizzle_f_xyzw: dst = (pr_vec4_t) { src[3], src[2], src[1], src[0] }; goto swizzle_f_done;\n"
        ));
        let entries: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("\t&&swizzle_f_")?.strip_suffix(','))
            .collect();
        assert_eq!(entries.len(), 256);
        for (perm, entry) in entries.iter().enumerate() {
            assert_eq!(decode_label(entry), Some(perm as u8));
        }

        let text = generate_dispatch(&InterpreterSyntax, Element::Double);
        assert!(text.contains("swizzle_d_wzyx: OPC(dvec4) = (pr_dvec4_t) { OPA(dvec4)[0],"));
    }

    #[test]
    fn fixtures() {
        let text = generate_fixtures();
        assert!(text.starts_with("#include \"head.c\"\n"));
        assert!(text.ends_with("#include \"main.c\"\n"));
        assert!(text.contains("\t{ OP(0, 0, 0, OP_SWIZZLE_F), 0, 0x001b, 112 },\n"));
        assert!(text.contains("\t{ OP(0, 0, 0, OP_SWIZZLE_D), 0, 0x03e4, 32 },\n"));
        assert!(text.contains("\t\t.desc = \"swizzle d zero\",\n"));
        assert_eq!(text.matches("\t\t.desc = ").count(), 6);
        let scenarios = scenarios();
        assert_eq!(scenarios[0].words.len(), 256);
        assert_eq!(scenarios[1].words.len(), 16);
        assert_eq!(scenarios[2].words.len(), 16);
    }
}
