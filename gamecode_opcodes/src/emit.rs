// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! C text emission for a resolved [`OpcodeTable`].

use alloc::string::String;
use core::fmt::Write as _;

use crate::group::{Descriptor, OpcodeTable};

/// Enum symbols per output row.
pub const ENUM_COLUMNS: usize = 4;

/// Minimum column width of one `SYMBOL,` entry.
pub const ENUM_COLUMN_WIDTH: usize = 15;

/// Options for [`render_enum`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumOptions {
    /// Prefix each row with the hex slot of its first column.
    pub debug: bool,
}

/// Renders the opcode enum body: [`ENUM_COLUMNS`] symbols per line in slot
/// order, spares named `OP_spare_<slot>`.
#[must_use]
pub fn render_enum(table: &OpcodeTable, options: EnumOptions) -> String {
    let mut out = String::new();
    let mut column = 0;
    for (slot, descriptor) in table.iter() {
        if column == 0 && options.debug {
            let _ = write!(out, "{slot:03x} ");
        }
        if column > 0 {
            out.push(' ');
        }
        let start = out.len();
        match descriptor {
            Some(d) => out.push_str(&d.symbol),
            None => {
                let _ = write!(out, "OP_spare_{slot}");
            }
        }
        out.push(',');
        while out.len() - start < ENUM_COLUMN_WIDTH {
            out.push(' ');
        }
        column += 1;
        if column == ENUM_COLUMNS {
            out.push('\n');
            column = 0;
        }
    }
    if column != 0 {
        out.push('\n');
    }
    out
}

/// Renders one C designated initializer per non-spare slot.
#[must_use]
pub fn render_table(table: &OpcodeTable) -> String {
    let mut out = String::new();
    for (_, d) in table.descriptors() {
        render_entry(&mut out, d);
    }
    out
}

fn render_entry(out: &mut String, d: &Descriptor) {
    let [wa, wb, wc] = d.widths;
    let [ta, tb, tc] = d.types;
    let _ = writeln!(out, "[{}] = {{", d.symbol);
    let _ = writeln!(out, "\t.opname = \"{}\",", CString(&d.opname));
    let _ = writeln!(out, "\t.mnemonic = \"{}\",", CString(&d.mnemonic));
    let _ = writeln!(out, "\t.widths = {{{wa}, {wb}, {wc}}},");
    let _ = writeln!(out, "\t.types = {{{ta}, {tb}, {tc}}},");
    match &d.format {
        Some(fmt) => {
            let _ = writeln!(out, "\t.fmt = \"{}\",", CString(fmt));
        }
        None => out.push_str("\t.fmt = 0,\n"),
    }
    out.push_str("},\n");
}

/// Displays a string escaped for a C string literal.
struct CString<'a>(&'a str);

impl core::fmt::Display for CString<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for ch in self.0.chars() {
            match ch {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\t' => f.write_str("\\t")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}
