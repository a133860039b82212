// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `conv` instruction: every legal `(width, src, dst)` conversion.
//!
//! Types are numbered by a 3-bit `ubf` code (unsigned, 64-bit, float). The two
//! codes that would name an unsigned float or double carry the bool types
//! instead, so no unsigned float conversion can be expressed.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use super::{Case, Operand, OperandSyntax, vector_type};

/// Conversion source or destination type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConvType {
    /// 32-bit signed integer.
    Int = 0,
    /// 32-bit float.
    Float = 1,
    /// 64-bit signed integer.
    Long = 2,
    /// 64-bit float.
    Double = 3,
    /// 32-bit unsigned integer.
    Uint = 4,
    /// 32-bit bool (true is all ones).
    Bool32 = 5,
    /// 64-bit unsigned integer.
    Ulong = 6,
    /// 64-bit bool (true is all ones).
    Bool64 = 7,
}

impl ConvType {
    /// Every type, in code order.
    pub const ALL: [Self; 8] = [
        Self::Int,
        Self::Float,
        Self::Long,
        Self::Double,
        Self::Uint,
        Self::Bool32,
        Self::Ulong,
        Self::Bool64,
    ];

    /// The 3-bit type code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Looks up a type by its code.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        if code < 8 {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    /// Returns `true` for the bool types.
    #[must_use]
    pub const fn is_bool(self) -> bool {
        matches!(self, Self::Bool32 | Self::Bool64)
    }

    /// Returns `true` for float and double.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// C element type.
    #[must_use]
    pub const fn scalar(self) -> &'static str {
        match self {
            Self::Int | Self::Bool32 => "int",
            Self::Float => "float",
            Self::Long | Self::Bool64 => "long",
            Self::Double => "double",
            Self::Uint => "uint",
            Self::Ulong => "ulong",
        }
    }

    /// Prefix of the C vector type (`ivec`, `dvec`, ...).
    #[must_use]
    pub const fn vector_prefix(self) -> &'static str {
        match self {
            Self::Int | Self::Bool32 => "ivec",
            Self::Float => "vec",
            Self::Long | Self::Bool64 => "lvec",
            Self::Double => "dvec",
            Self::Uint => "uivec",
            Self::Ulong => "ulvec",
        }
    }
}

/// How one matrix cell converts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConversionMode {
    /// No conversion exists.
    Illegal,
    /// Numeric cast.
    Cast,
    /// Truth test producing 0 or 1 (`!!x`).
    BoolCoerce,
    /// Truth test producing 0 or all ones (`-!!x`).
    NegatedBoolCoerce,
}

const fn matrix_mode(src: ConvType, dst: ConvType) -> ConversionMode {
    if src as u8 == dst as u8 {
        ConversionMode::Illegal
    } else if dst.is_bool() {
        ConversionMode::NegatedBoolCoerce
    } else if src.is_bool() {
        ConversionMode::BoolCoerce
    } else {
        ConversionMode::Cast
    }
}

/// Conversion modes indexed by `[src][dst]` type code.
pub const CONVERSION_MATRIX: [[ConversionMode; 8]; 8] = {
    let mut m = [[ConversionMode::Illegal; 8]; 8];
    let mut s = 0;
    while s < 8 {
        let mut d = 0;
        while d < 8 {
            m[s][d] = matrix_mode(ConvType::ALL[s], ConvType::ALL[d]);
            d += 1;
        }
        s += 1;
    }
    m
};

/// Returns the matrix cell for `src` to `dst`.
#[must_use]
pub const fn mode(src: ConvType, dst: ConvType) -> ConversionMode {
    CONVERSION_MATRIX[src as usize][dst as usize]
}

/// Case label: `((width - 1) << 6) | (src << 3) | dst`, or `None` if
/// `width` is outside `1..=4`.
#[must_use]
pub const fn label(width: u32, src: ConvType, dst: ConvType) -> Option<u32> {
    if width == 0 || width > 4 {
        return None;
    }
    Some(((width - 1) << 6) | (src.code() << 3) | dst.code())
}

/// Decodes a label into `(width, src, dst)`.
#[must_use]
pub const fn decode_label(code: u32) -> Option<(u32, ConvType, ConvType)> {
    if code > 0o377 {
        return None;
    }
    let (Some(src), Some(dst)) = (
        ConvType::from_code((code >> 3) & 7),
        ConvType::from_code(code & 7),
    ) else {
        return None;
    };
    Some(((code >> 6) + 1, src, dst))
}

/// Generates the body for one conversion, or `None` for illegal cells.
pub fn conversion_body(
    syntax: &impl OperandSyntax,
    width: u32,
    src: ConvType,
    dst: ConvType,
) -> Option<String> {
    body_for_mode(syntax, mode(src, dst), width, src, dst)
}

/// Generates the body converting `src` to `dst` with an explicit `mode`.
///
/// Returns `None` for [`ConversionMode::Illegal`] and widths outside `1..=4`.
pub fn body_for_mode(
    syntax: &impl OperandSyntax,
    mode: ConversionMode,
    width: u32,
    src: ConvType,
    dst: ConvType,
) -> Option<String> {
    let op = match mode {
        ConversionMode::Illegal => return None,
        ConversionMode::Cast => format!("({})", dst.scalar()),
        ConversionMode::BoolCoerce => "!!".into(),
        ConversionMode::NegatedBoolCoerce => "-!!".into(),
    };
    let body = match width {
        1 => {
            let d = syntax.operand(Operand::C, dst.scalar());
            let s = syntax.operand(Operand::A, src.scalar());
            match mode {
                ConversionMode::Cast => format!("{d} = {op} {s};"),
                _ => format!("{d} = {op}{s};"),
            }
        }
        3 => {
            let d = syntax.operand(Operand::C, dst.scalar());
            let s = syntax.operand(Operand::A, src.scalar());
            format!("VectorCompUop (&{d}, {op}, &{s});")
        }
        2 | 4 if src.is_float() == dst.is_float() => {
            let dst_view = format!("{}{width}", dst.vector_prefix());
            let d = syntax.operand(Operand::C, &dst_view);
            let s = syntax.operand(Operand::A, &format!("{}{width}", src.vector_prefix()));
            // Vector compares yield 0 or -1 per component.
            let value = match mode {
                ConversionMode::BoolCoerce => format!("-({s} != 0)"),
                ConversionMode::NegatedBoolCoerce => format!("({s} != 0)"),
                _ => s,
            };
            format!(
                "{d} = __builtin_convertvector ({value}, {});",
                vector_type(&dst_view)
            )
        }
        2 | 4 => {
            let d = syntax.operand(Operand::C, dst.scalar());
            let s = syntax.operand(Operand::A, src.scalar());
            format!("for (int i = 0; i < {width}; i++) (&{d})[i] = {op} (&{s})[i];")
        }
        _ => return None,
    };
    Some(body)
}

/// Generates every legal conversion case, ordered by label.
pub fn generate_conversions(syntax: &impl OperandSyntax) -> Vec<Case> {
    let mut cases = Vec::new();
    for width in 1..=4 {
        for src in ConvType::ALL {
            for dst in ConvType::ALL {
                let (Some(code), Some(body)) =
                    (label(width, src, dst), conversion_body(syntax, width, src, dst))
                else {
                    continue;
                };
                cases.push(Case {
                    code,
                    label: format!("0{code:03o}"),
                    body,
                });
            }
        }
    }
    tracing::debug!(cases = cases.len(), "generated conversions");
    cases
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::families::{InterpreterSyntax, PlainSyntax};

    #[test]
    fn matrix_policy() {
        use ConversionMode::*;
        assert_eq!(mode(ConvType::Int, ConvType::Int), Illegal);
        assert_eq!(mode(ConvType::Int, ConvType::Double), Cast);
        assert_eq!(mode(ConvType::Ulong, ConvType::Float), Cast);
        assert_eq!(mode(ConvType::Float, ConvType::Bool32), NegatedBoolCoerce);
        assert_eq!(mode(ConvType::Bool64, ConvType::Uint), BoolCoerce);
        assert_eq!(mode(ConvType::Bool32, ConvType::Bool64), NegatedBoolCoerce);
        assert_eq!(mode(ConvType::Bool64, ConvType::Bool32), NegatedBoolCoerce);
        let illegal = CONVERSION_MATRIX
            .iter()
            .flatten()
            .filter(|m| **m == Illegal)
            .count();
        assert_eq!(illegal, 8);
    }

    #[test]
    fn scalar_bool_coerce_is_a_truth_test() {
        let body = body_for_mode(
            &PlainSyntax,
            ConversionMode::BoolCoerce,
            1,
            ConvType::Int,
            ConvType::Float,
        );
        assert_eq!(body.as_deref(), Some("dst = !!src;"));
        let body = conversion_body(&PlainSyntax, 1, ConvType::Bool32, ConvType::Float);
        assert_eq!(body.as_deref(), Some("dst = !!src;"));
        let body = conversion_body(&PlainSyntax, 1, ConvType::Int, ConvType::Float);
        assert_eq!(body.as_deref(), Some("dst = (float) src;"));
        let body = conversion_body(&InterpreterSyntax, 1, ConvType::Double, ConvType::Bool64);
        assert_eq!(body.as_deref(), Some("OPC(long) = -!!OPA(double);"));
    }

    #[test]
    fn vector_shapes() {
        let s = InterpreterSyntax;
        assert_eq!(
            conversion_body(&s, 3, ConvType::Int, ConvType::Float).unwrap(),
            "VectorCompUop (&OPC(float), (float), &OPA(int));"
        );
        assert_eq!(
            conversion_body(&s, 2, ConvType::Float, ConvType::Double).unwrap(),
            "OPC(dvec2) = __builtin_convertvector (OPA(vec2), pr_dvec2_t);"
        );
        assert_eq!(
            conversion_body(&s, 4, ConvType::Bool32, ConvType::Long).unwrap(),
            "OPC(lvec4) = __builtin_convertvector (-(OPA(ivec4) != 0), pr_lvec4_t);"
        );
        assert_eq!(
            conversion_body(&s, 4, ConvType::Int, ConvType::Float).unwrap(),
            "for (int i = 0; i < 4; i++) (&OPC(float))[i] = (float) (&OPA(int))[i];"
        );
        assert_eq!(conversion_body(&s, 2, ConvType::Uint, ConvType::Uint), None);
    }

    #[test]
    fn coverage_and_unique_labels() {
        let cases = generate_conversions(&InterpreterSyntax);
        assert_eq!(cases.len(), 4 * 56);
        for pair in cases.windows(2) {
            assert!(pair[0].code < pair[1].code);
        }
        for case in &cases {
            let (width, src, dst) = decode_label(case.code).unwrap();
            assert_eq!(label(width, src, dst), Some(case.code));
            assert_ne!(mode(src, dst), ConversionMode::Illegal);
            assert_eq!(u32::from_str_radix(&case.label, 8).unwrap(), case.code);
        }
        assert_eq!(cases[0].label, "0001");
        assert_eq!(cases.last().unwrap().label, "0376");
        assert_eq!(label(0, ConvType::Int, ConvType::Float), None);
        assert_eq!(label(5, ConvType::Int, ConvType::Float), None);
    }
}
