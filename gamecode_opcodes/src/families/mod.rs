// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generators for the instruction families that are implemented as literal
//! dispatch code instead of table rows.
//!
//! Each generator iterates its own small matrix and produces [`Case`]
//! fragments for splicing into the interpreter's `switch`. Operand access is
//! spelled through an [`OperandSyntax`], so the same generator can target the
//! interpreter macros or plain names.

use alloc::format;
use alloc::string::String;
use core::fmt;
use core::fmt::Write as _;

pub mod convert;
pub mod extend;
pub mod hops;
pub mod swizzle;

/// Instruction operand position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// The `a` operand (source).
    A,
    /// The `c` operand (destination).
    C,
}

/// Spells an operand access viewed as a C element or vector type.
pub trait OperandSyntax {
    /// Returns an lvalue for `operand` viewed as `c_type` (`int`, `vec4`, ...).
    fn operand(&self, operand: Operand, c_type: &str) -> String;
}

/// Interpreter macros: `OPA(int)`, `OPC(vec4)`.
#[derive(Copy, Clone, Debug, Default)]
pub struct InterpreterSyntax;

impl OperandSyntax for InterpreterSyntax {
    fn operand(&self, operand: Operand, c_type: &str) -> String {
        match operand {
            Operand::A => format!("OPA({c_type})"),
            Operand::C => format!("OPC({c_type})"),
        }
    }
}

/// Plain `src` and `dst` names, ignoring the type view.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlainSyntax;

impl OperandSyntax for PlainSyntax {
    fn operand(&self, operand: Operand, _c_type: &str) -> String {
        match operand {
            Operand::A => "src".into(),
            Operand::C => "dst".into(),
        }
    }
}

/// One `case` fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Case {
    /// Numeric case label, used for ordering and uniqueness checks.
    pub code: u32,
    /// Label as written in C.
    pub label: String,
    /// Statement(s), each terminated by `;`.
    pub body: String,
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case {}: {} break;", self.label, self.body)
    }
}

/// Renders `cases` one per line.
#[must_use]
pub fn render_cases(cases: &[Case]) -> String {
    let mut out = String::new();
    for case in cases {
        let _ = writeln!(out, "{case}");
    }
    out
}

/// `pr_<vec>_t`, the C vector type behind an operand view.
pub(crate) fn vector_type(view: &str) -> String {
    format!("pr_{view}_t")
}
