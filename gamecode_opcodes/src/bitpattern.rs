// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bit-pattern rows and their expansion over an opcode address space.
//!
//! A bitmap is a list of rows. Each row is a pattern of literal bits and named
//! wildcard runs (`0 0000 mmss`) spanning the whole address width, plus an
//! optional group label. Expanding a bitmap walks every row in declaration
//! order and binds each covered slot to the row's group, with one parameter per
//! wildcard run. Later rows replace earlier ones where they overlap.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::trace::{TraceMask, TraceSink};

/// Largest supported address width, in bits.
pub const MAX_ADDRESS_WIDTH: u32 = 16;

/// Bitmap parse or expansion error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BitPatternError {
    /// The table's address width is zero or larger than [`MAX_ADDRESS_WIDTH`].
    AddressWidth {
        /// Requested width.
        width: u32,
    },
    /// A pattern contained something other than `0`, `1`, a letter or whitespace.
    InvalidChar {
        /// Offending character.
        ch: char,
    },
    /// A pattern does not span exactly the table's address width.
    WidthMismatch {
        /// Pattern text as written.
        pattern: Box<str>,
        /// Table address width.
        expected: u32,
        /// Total width of the pattern.
        found: u32,
    },
    /// A labeled row binds the same wildcard name twice.
    DuplicateParam {
        /// Wildcard run name.
        name: Box<str>,
    },
    /// Some slots were not covered by any row.
    Uncovered {
        /// Lowest uncovered slot.
        first: u32,
        /// Number of uncovered slots.
        count: usize,
    },
    /// An error attributed to a bitmap line.
    AtLine {
        /// 1-based line number.
        line: usize,
        /// The underlying error.
        error: Box<BitPatternError>,
    },
}

impl BitPatternError {
    fn at_line(self, line: usize) -> Self {
        Self::AtLine {
            line,
            error: Box::new(self),
        }
    }
}

impl fmt::Display for BitPatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressWidth { width } => write!(
                f,
                "unsupported address width {width} (expected 1..={MAX_ADDRESS_WIDTH})"
            ),
            Self::InvalidChar { ch } => write!(f, "invalid pattern character {ch:?}"),
            Self::WidthMismatch {
                pattern,
                expected,
                found,
            } => write!(
                f,
                "pattern '{pattern}' is {found} bits wide, table is {expected} bits"
            ),
            Self::DuplicateParam { name } => {
                write!(f, "wildcard '{name}' is bound twice in one row")
            }
            Self::Uncovered { first, count } => write!(
                f,
                "{count} slot(s) not covered by any row (first: {first:#05x})"
            ),
            Self::AtLine { line, error } => write!(f, "line {line}: {error}"),
        }
    }
}

impl core::error::Error for BitPatternError {}

/// One run of a bit pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// Literal bits.
    Fixed {
        /// Value of the run, most significant bit first.
        value: u32,
        /// Number of bits.
        width: u32,
    },
    /// A named wildcard; expansion iterates all `2^width` values.
    Wildcard {
        /// The run as written (`ss`, `ooo`, `t`); this is the parameter name.
        name: Box<str>,
        /// Number of bits.
        width: u32,
    },
}

impl Field {
    /// Width of this run in bits.
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Self::Fixed { width, .. } | Self::Wildcard { width, .. } => *width,
        }
    }
}

/// A parsed bit pattern: an ordered list of runs spanning the address width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitPattern {
    text: Box<str>,
    fields: Vec<Field>,
}

impl BitPattern {
    /// Parses `text` as a pattern for a table `address_width` bits wide.
    ///
    /// Whitespace is ignored. Consecutive identical letters form one wildcard
    /// run; consecutive `0`/`1` digits form one literal run.
    pub fn parse(text: &str, address_width: u32) -> Result<Self, BitPatternError> {
        check_address_width(address_width)?;

        let mut found = 0_u32;
        for ch in text.chars().filter(|c| !c.is_whitespace()) {
            if !(ch == '0' || ch == '1' || ch.is_ascii_alphabetic()) {
                return Err(BitPatternError::InvalidChar { ch });
            }
            found += 1;
        }
        if found != address_width {
            return Err(BitPatternError::WidthMismatch {
                pattern: text.trim().into(),
                expected: address_width,
                found,
            });
        }

        let mut fields: Vec<Field> = Vec::new();
        let mut run = String::new();
        for ch in text.chars().filter(|c| !c.is_whitespace()) {
            let bit = ch == '0' || ch == '1';
            match fields.last_mut() {
                Some(Field::Fixed { value, width }) if bit => {
                    *value = (*value << 1) | u32::from(ch == '1');
                    *width += 1;
                    continue;
                }
                Some(Field::Wildcard { width, .. }) if run.starts_with(ch) => {
                    run.push(ch);
                    *width += 1;
                    continue;
                }
                _ => {}
            }
            close_run(&mut fields, &mut run);
            if bit {
                fields.push(Field::Fixed {
                    value: u32::from(ch == '1'),
                    width: 1,
                });
            } else {
                run.push(ch);
                fields.push(Field::Wildcard {
                    name: Box::from(""),
                    width: 1,
                });
            }
        }
        close_run(&mut fields, &mut run);

        Ok(Self {
            text: text.trim().into(),
            fields,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The runs of this pattern, most significant first.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total width in bits.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.fields.iter().map(Field::width).sum()
    }

    /// Calls `visit` once for every slot the pattern covers, in ascending
    /// wildcard order, with the wildcard values bound for that slot.
    pub fn expand<F: FnMut(u32, &[Param])>(&self, mut visit: F) {
        let mut params = Vec::with_capacity(self.fields.len());
        expand_fields(&self.fields, 0, &mut params, &mut visit);
    }
}

// Names the wildcard run that was just completed.
fn close_run(fields: &mut [Field], run: &mut String) {
    if run.is_empty() {
        return;
    }
    if let Some(Field::Wildcard { name, .. }) = fields.last_mut() {
        *name = core::mem::take(run).into_boxed_str();
    }
}

fn expand_fields<F: FnMut(u32, &[Param])>(
    fields: &[Field],
    addr: u32,
    params: &mut Vec<Param>,
    visit: &mut F,
) {
    let Some((first, rest)) = fields.split_first() else {
        visit(addr, params);
        return;
    };
    match first {
        Field::Fixed { value, width } => {
            expand_fields(rest, (addr << width) | value, params, visit);
        }
        Field::Wildcard { name, width } => {
            for n in 0..(1_u32 << width) {
                params.push(Param {
                    name: name.clone(),
                    value: n,
                });
                expand_fields(rest, (addr << width) | n, params, visit);
                params.pop();
            }
        }
    }
}

fn check_address_width(width: u32) -> Result<(), BitPatternError> {
    if width == 0 || width > MAX_ADDRESS_WIDTH {
        return Err(BitPatternError::AddressWidth { width });
    }
    Ok(())
}

/// One bound wildcard value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    /// Wildcard run name.
    pub name: Box<str>,
    /// Value the run takes in this slot.
    pub value: u32,
}

/// One bitmap row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// 1-based source line (or insertion index for rows pushed by hand).
    pub line: usize,
    /// The bit pattern.
    pub pattern: BitPattern,
    /// Group label; `None` marks the covered slots spare.
    pub group: Option<Box<str>>,
    /// Trailing free-form text.
    pub comment: Option<Box<str>>,
}

/// An ordered list of rows over one address space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    address_width: u32,
    rows: Vec<Row>,
}

impl Bitmap {
    /// Creates an empty bitmap.
    pub fn new(address_width: u32) -> Result<Self, BitPatternError> {
        check_address_width(address_width)?;
        Ok(Self {
            address_width,
            rows: Vec::new(),
        })
    }

    /// Parses bitmap text: one row per line, `#` lines and blank lines ignored.
    ///
    /// Whitespace-separated pattern tokens are taken until the address width is
    /// reached. The next token is the group label and anything after it is a
    /// comment.
    pub fn parse(text: &str, address_width: u32) -> Result<Self, BitPatternError> {
        let mut bitmap = Self::new(address_width)?;
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut tokens = trimmed.split_whitespace();
            let mut pattern = String::new();
            let mut bits = 0_usize;
            while bits < address_width as usize {
                let Some(tok) = tokens.next() else {
                    break;
                };
                if !pattern.is_empty() {
                    pattern.push(' ');
                }
                pattern.push_str(tok);
                bits += tok.chars().count();
            }
            let group = tokens.next().map(Box::from);
            let rest: Vec<&str> = tokens.collect();
            let comment = (!rest.is_empty()).then(|| rest.join(" ").into_boxed_str());

            let pattern = BitPattern::parse(&pattern, address_width)
                .map_err(|e| e.at_line(line_no))?;
            bitmap.push_row(Row {
                line: line_no,
                pattern,
                group,
                comment,
            })?;
        }
        Ok(bitmap)
    }

    /// Appends a row built from `pattern` and `group`.
    pub fn push(&mut self, pattern: &str, group: Option<&str>) -> Result<(), BitPatternError> {
        let line = self.rows.len() + 1;
        let pattern =
            BitPattern::parse(pattern, self.address_width).map_err(|e| e.at_line(line))?;
        self.push_row(Row {
            line,
            pattern,
            group: group.map(Box::from),
            comment: None,
        })
    }

    fn push_row(&mut self, row: Row) -> Result<(), BitPatternError> {
        if row.pattern.width() != self.address_width {
            return Err(BitPatternError::WidthMismatch {
                pattern: row.pattern.text().into(),
                expected: self.address_width,
                found: row.pattern.width(),
            }
            .at_line(row.line));
        }
        if row.group.is_some() {
            let names: Vec<&str> = row
                .pattern
                .fields()
                .iter()
                .filter_map(|f| match f {
                    Field::Wildcard { name, .. } => Some(&**name),
                    Field::Fixed { .. } => None,
                })
                .collect();
            for (i, name) in names.iter().enumerate() {
                if names[..i].contains(name) {
                    return Err(BitPatternError::DuplicateParam {
                        name: (*name).into(),
                    }
                    .at_line(row.line));
                }
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Address width in bits.
    #[must_use]
    pub fn address_width(&self) -> u32 {
        self.address_width
    }

    /// Number of slots in the address space.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        1_usize << self.address_width
    }

    /// Rows in declaration order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// A slot bound to a group, with the row's wildcard values in pattern order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupBinding {
    /// Group name.
    pub group: Box<str>,
    /// Bound wildcard values, most significant run first.
    pub params: Vec<Param>,
    /// Bitmap line of the row that bound the slot.
    pub line: usize,
}

impl GroupBinding {
    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u32> {
        self.params
            .iter()
            .find(|p| &*p.name == name)
            .map(|p| p.value)
    }
}

/// Final outcome of one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotBinding {
    /// Covered by a row without a group label.
    Spare {
        /// Bitmap line of the row.
        line: usize,
    },
    /// Bound to a group.
    Group(GroupBinding),
}

impl SlotBinding {
    fn line(&self) -> usize {
        match self {
            Self::Spare { line } => *line,
            Self::Group(g) => g.line,
        }
    }
}

/// The expanded address space: one binding per slot.
///
/// An `OpcodeMap` is built and owned by a single expansion; nothing is shared
/// between runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpcodeMap {
    address_width: u32,
    slots: Vec<SlotBinding>,
}

impl OpcodeMap {
    /// Expands every row of `bitmap` in declaration order.
    pub fn expand(bitmap: &Bitmap) -> Result<Self, BitPatternError> {
        Self::expand_traced(bitmap, TraceMask::NONE, None)
    }

    /// Like [`OpcodeMap::expand`], reporting the events in `trace_mask` to `trace`.
    pub fn expand_traced(
        bitmap: &Bitmap,
        trace_mask: TraceMask,
        mut trace: Option<&mut dyn TraceSink>,
    ) -> Result<Self, BitPatternError> {
        let trace_rows = trace.is_some() && trace_mask.contains(TraceMask::ROW);
        let trace_overwrites = trace.is_some() && trace_mask.contains(TraceMask::OVERWRITE);

        let mut slots: Vec<Option<SlotBinding>> = vec![None; bitmap.slot_count()];
        for row in bitmap.rows() {
            if trace_rows {
                if let Some(t) = trace.as_deref_mut() {
                    t.row_start(row);
                }
            }
            let mut written = 0_usize;
            row.pattern.expand(|addr, params| {
                let binding = match &row.group {
                    Some(group) => SlotBinding::Group(GroupBinding {
                        group: group.clone(),
                        params: params.to_vec(),
                        line: row.line,
                    }),
                    None => SlotBinding::Spare { line: row.line },
                };
                let prev = slots[addr as usize].replace(binding);
                if let (true, Some(prev)) = (trace_overwrites, prev) {
                    if let Some(t) = trace.as_deref_mut() {
                        t.slot_overwrite(addr, prev.line(), row);
                    }
                }
                written += 1;
            });
            if trace_rows {
                if let Some(t) = trace.as_deref_mut() {
                    t.row_end(row, written);
                }
            }
        }

        let uncovered = slots.iter().filter(|s| s.is_none()).count();
        if let Some(first) = slots.iter().position(Option::is_none) {
            return Err(BitPatternError::Uncovered {
                first: first as u32,
                count: uncovered,
            });
        }
        let slots: Vec<SlotBinding> = slots.into_iter().flatten().collect();
        tracing::debug!(
            rows = bitmap.rows().len(),
            slots = slots.len(),
            "expanded bitmap"
        );
        Ok(Self {
            address_width: bitmap.address_width(),
            slots,
        })
    }

    /// Address width in bits.
    #[must_use]
    pub fn address_width(&self) -> u32 {
        self.address_width
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the map has no slots (never the case for a valid bitmap).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the binding for `slot`.
    #[must_use]
    pub fn get(&self, slot: u32) -> Option<&SlotBinding> {
        self.slots.get(slot as usize)
    }

    /// Iterates `(slot, binding)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &SlotBinding)> {
        self.slots.iter().enumerate().map(|(i, s)| (i as u32, s))
    }

    /// Number of spare slots.
    #[must_use]
    pub fn spare_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, SlotBinding::Spare { .. }))
            .count()
    }
}
