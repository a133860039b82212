// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `extend` instruction: grow a 1-3 component vector to 2-4 components.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use super::{Case, Operand, OperandSyntax, vector_type};

/// Supported `(source, destination)` widths, indexed by transition code.
pub const TRANSITIONS: [(u32, u32); 6] = [(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)];

/// Value written to each new component.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Fill {
    /// Integer or float zero.
    Zero = 0,
    /// `+1.0`.
    One = 1,
    /// `-1.0`.
    MinusOne = 2,
    /// The last real source component.
    Copy = 3,
}

impl Fill {
    /// Every fill, in code order.
    pub const ALL: [Self; 4] = [Self::Zero, Self::One, Self::MinusOne, Self::Copy];
}

/// Parameters of one extend case.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Extend {
    transition: u32,
    fill: Fill,
    wide: bool,
    reverse: bool,
}

impl Extend {
    /// Creates a case. `transition` indexes [`TRANSITIONS`]; `wide` selects
    /// 64-bit elements and `reverse` fills the low components.
    ///
    /// Returns `None` if `transition` is out of range.
    #[must_use]
    pub const fn new(transition: u32, fill: Fill, wide: bool, reverse: bool) -> Option<Self> {
        if transition as usize >= TRANSITIONS.len() {
            return None;
        }
        Some(Self {
            transition,
            fill,
            wide,
            reverse,
        })
    }

    /// Case label: `(reverse << 6) | (wide << 5) | (fill << 3) | transition`.
    #[must_use]
    pub const fn label(self) -> u32 {
        ((self.reverse as u32) << 6)
            | ((self.wide as u32) << 5)
            | ((self.fill as u32) << 3)
            | self.transition
    }

    /// Source and destination widths.
    #[must_use]
    pub const fn widths(self) -> (u32, u32) {
        TRANSITIONS[self.transition as usize]
    }

    fn element(self) -> &'static str {
        if self.wide { "long" } else { "int" }
    }

    fn view(self, width: u32) -> String {
        match width {
            1 | 3 => self.element().into(),
            _ => format!("{}vec{width}", if self.wide { "l" } else { "i" }),
        }
    }

    fn fill_value(self, last_source: &str) -> String {
        match (self.fill, self.wide) {
            (Fill::Zero, _) => "0".into(),
            (Fill::One, false) => format!("{:#010x}", 1.0_f32.to_bits()),
            (Fill::MinusOne, false) => format!("{:#010x}", (-1.0_f32).to_bits()),
            (Fill::One, true) => format!("{:#018x}", 1.0_f64.to_bits()),
            (Fill::MinusOne, true) => format!("{:#018x}", (-1.0_f64).to_bits()),
            (Fill::Copy, _) => last_source.into(),
        }
    }

    /// Destination components in order.
    pub fn components(self, syntax: &impl OperandSyntax) -> Vec<String> {
        let (from, to) = self.widths();
        let src = syntax.operand(Operand::A, &self.view(from));
        let sources: Vec<String> = match from {
            1 => alloc::vec![src],
            2 => (0..from).map(|i| format!("{src}[{i}]")).collect(),
            _ => (0..from).map(|i| format!("(&{src})[{i}]")).collect(),
        };
        let fill = self.fill_value(&sources[sources.len() - 1]);
        let fills = (from..to).map(|_| fill.clone());
        if self.reverse {
            fills.chain(sources).collect()
        } else {
            sources.into_iter().chain(fills).collect()
        }
    }

    /// Statement storing the extended vector.
    pub fn body(self, syntax: &impl OperandSyntax) -> String {
        let (_, to) = self.widths();
        let components = self.components(syntax);
        if to == 3 {
            let dst = syntax.operand(Operand::C, self.element());
            format!("VectorSet ({}, &{dst});", components.join(", "))
        } else {
            let view = self.view(to);
            let dst = syntax.operand(Operand::C, &view);
            format!(
                "{dst} = ({}) {{ {} }};",
                vector_type(&view),
                components.join(", ")
            )
        }
    }
}

/// Generates every extend case, ordered by label.
pub fn generate_extends(syntax: &impl OperandSyntax) -> Vec<Case> {
    let mut cases = Vec::new();
    for reverse in [false, true] {
        for wide in [false, true] {
            for fill in Fill::ALL {
                for transition in 0..TRANSITIONS.len() as u32 {
                    let Some(ext) = Extend::new(transition, fill, wide, reverse) else {
                        continue;
                    };
                    let code = ext.label();
                    cases.push(Case {
                        code,
                        label: format!("0{code:03o}"),
                        body: ext.body(syntax),
                    });
                }
            }
        }
    }
    tracing::debug!(cases = cases.len(), "generated extends");
    cases
}
