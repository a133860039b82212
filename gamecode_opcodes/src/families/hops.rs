// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `hops` instruction: fold every component of a vector through one
//! binary operator.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use super::{Case, Operand, OperandSyntax};

/// Horizontal operator, numbered by its 3-bit slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum HopOp {
    /// Bitwise and.
    And = 0,
    /// Bitwise or.
    Or = 1,
    /// Bitwise xor.
    Xor = 2,
    /// Signed integer add.
    Add = 3,
    /// Complemented and.
    Nand = 4,
    /// Complemented or.
    Nor = 5,
    /// Complemented xor.
    Xnor = 6,
    /// Float add. Occupies the slot a complemented add would take.
    FAdd = 7,
}

impl HopOp {
    /// Every operator, in slot order.
    pub const ALL: [Self; 8] = [
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Add,
        Self::Nand,
        Self::Nor,
        Self::Xnor,
        Self::FAdd,
    ];

    /// C operator token passed to the fold helper.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::And | Self::Nand => "&",
            Self::Or | Self::Nor => "|",
            Self::Xor | Self::Xnor => "^",
            Self::Add | Self::FAdd => "+",
        }
    }

    /// Returns `true` if the folded result is complemented.
    #[must_use]
    pub const fn complemented(self) -> bool {
        matches!(self, Self::Nand | Self::Nor | Self::Xnor)
    }

    /// Element type for 32- or 64-bit operands.
    #[must_use]
    pub const fn element(self, wide: bool) -> &'static str {
        match (self, wide) {
            (Self::FAdd, false) => "float",
            (Self::FAdd, true) => "double",
            (_, false) => "int",
            (_, true) => "long",
        }
    }

    const fn vector_prefix(self, wide: bool) -> &'static str {
        match (self, wide) {
            (Self::FAdd, false) => "vec",
            (Self::FAdd, true) => "dvec",
            (_, false) => "ivec",
            (_, true) => "lvec",
        }
    }
}

/// Case label: `(op << 3) | (wide << 2) | (width - 1)`, or `None` if
/// `width` is outside `2..=4`.
#[must_use]
pub const fn label(op: HopOp, wide: bool, width: u32) -> Option<u32> {
    if width < 2 || width > 4 {
        return None;
    }
    Some(((op as u32) << 3) | ((wide as u32) << 2) | (width - 1))
}

/// Generates the body folding a `width`-component operand.
pub fn hop_body(syntax: &impl OperandSyntax, op: HopOp, wide: bool, width: u32) -> String {
    let dst = syntax.operand(Operand::C, op.element(wide));
    let src = if width == 3 {
        format!("&{}", syntax.operand(Operand::A, op.element(wide)))
    } else {
        syntax.operand(Operand::A, &format!("{}{width}", op.vector_prefix(wide)))
    };
    let not = if op.complemented() { "~" } else { "" };
    format!("{dst} = {not}vhop{width} ({src}, {});", op.token())
}

/// Generates every hops case, ordered by label.
pub fn generate_hops(syntax: &impl OperandSyntax) -> Vec<Case> {
    let mut cases = Vec::new();
    for op in HopOp::ALL {
        for wide in [false, true] {
            for width in 2..=4 {
                let Some(code) = label(op, wide, width) else {
                    continue;
                };
                cases.push(Case {
                    code,
                    label: format!("{code}"),
                    body: hop_body(syntax, op, wide, width),
                });
            }
        }
    }
    tracing::debug!(cases = cases.len(), "generated hops");
    cases
}
