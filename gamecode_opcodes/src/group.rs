// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Group specifications and the resolver that turns slot bindings into
//! instruction descriptors.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use serde::Deserialize;

use crate::bitpattern::{OpcodeMap, Param, SlotBinding};
use crate::template::{Args, Namespace, Template, TemplateError};
use crate::value_type::ValueType;

/// Disassembly format used when a group does not name one.
pub const DEFAULT_FORMAT: &str = "%Ga, %Gb, %gc";

#[derive(Deserialize)]
struct GroupFile {
    version: u32,
    groups: BTreeMap<String, RawGroup>,
}

fn default_format() -> Option<String> {
    Some(DEFAULT_FORMAT.into())
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGroup {
    opcode: String,
    mnemonic: String,
    opname: String,
    // Missing means the default format; `null` means no operands.
    #[serde(default = "default_format")]
    format: Option<String>,
    widths: String,
    types: String,
    #[serde(default)]
    args: Args,
}

/// A descriptor field, used to attribute errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DescriptorField {
    /// Opcode enum symbol.
    Opcode,
    /// Assembler mnemonic.
    Mnemonic,
    /// Human opcode name.
    Opname,
    /// Disassembly format.
    Format,
    /// Operand widths.
    Widths,
    /// Operand types.
    Types,
}

impl DescriptorField {
    /// Key used in the group file.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Opcode => "opcode",
            Self::Mnemonic => "mnemonic",
            Self::Opname => "opname",
            Self::Format => "format",
            Self::Widths => "widths",
            Self::Types => "types",
        }
    }
}

impl fmt::Display for DescriptorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error loading a group file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupTableError {
    /// The JSON did not match the group file schema.
    Json {
        /// Parser message.
        message: Box<str>,
    },
    /// The file's `version` is not supported.
    UnsupportedVersion {
        /// Version found.
        version: u32,
    },
    /// A template failed to parse.
    Template {
        /// Group name.
        group: Box<str>,
        /// Field holding the template.
        field: DescriptorField,
        /// Parse error.
        error: TemplateError,
    },
}

impl fmt::Display for GroupTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { message } => write!(f, "invalid group file: {message}"),
            Self::UnsupportedVersion { version } => {
                write!(f, "unsupported group file version {version}")
            }
            Self::Template {
                group,
                field,
                error,
            } => write!(f, "group '{group}' field '{field}': {error}"),
        }
    }
}

impl core::error::Error for GroupTableError {}

/// Why one field of one slot failed to resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// Template evaluation failed.
    Template(TemplateError),
    /// The widths did not resolve to three integers in `-1..=4`.
    BadWidths(Box<str>),
    /// The types did not resolve to three `ev_*` names.
    BadTypes(Box<str>),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(e) => write!(f, "{e}"),
            Self::BadWidths(text) => {
                write!(f, "'{text}' is not three operand widths in -1..=4")
            }
            Self::BadTypes(text) => write!(f, "'{text}' is not three value types"),
        }
    }
}

/// Resolver error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// A bitmap row names a group with no specification.
    UnknownGroup {
        /// Slot being resolved.
        slot: u32,
        /// Bitmap line of the row.
        line: usize,
        /// Group name.
        group: Box<str>,
    },
    /// A field failed to resolve.
    Field {
        /// Slot being resolved.
        slot: u32,
        /// Group name.
        group: Box<str>,
        /// The field.
        field: DescriptorField,
        /// What went wrong.
        error: FieldError,
    },
    /// Two slots resolved to the same opcode symbol.
    DuplicateSymbol {
        /// The symbol.
        symbol: Box<str>,
        /// Slot that claimed it first.
        first: u32,
        /// Slot that claimed it again.
        slot: u32,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGroup { slot, line, group } => write!(
                f,
                "slot {slot:#05x}: unknown group '{group}' (bitmap line {line})"
            ),
            Self::Field {
                slot,
                group,
                field,
                error,
            } => write!(f, "slot {slot:#05x}: group '{group}' field '{field}': {error}"),
            Self::DuplicateSymbol {
                symbol,
                first,
                slot,
            } => write!(
                f,
                "opcode symbol {symbol} used by slots {first:#05x} and {slot:#05x}"
            ),
        }
    }
}

impl core::error::Error for ResolveError {}

/// Templates for one group.
#[derive(Clone, Debug)]
pub struct GroupSpec {
    opcode: Template,
    mnemonic: Template,
    opname: Template,
    format: Option<Template>,
    widths: Template,
    types: Template,
    args: Args,
}

impl GroupSpec {
    fn from_raw(name: &str, raw: RawGroup) -> Result<Self, GroupTableError> {
        let parse = |field, text: &str| {
            Template::parse(text).map_err(|error| GroupTableError::Template {
                group: name.into(),
                field,
                error,
            })
        };
        Ok(Self {
            opcode: parse(DescriptorField::Opcode, &raw.opcode)?,
            mnemonic: parse(DescriptorField::Mnemonic, &raw.mnemonic)?,
            opname: parse(DescriptorField::Opname, &raw.opname)?,
            format: raw
                .format
                .as_deref()
                .map(|f| parse(DescriptorField::Format, f))
                .transpose()?,
            widths: parse(DescriptorField::Widths, &raw.widths)?,
            types: parse(DescriptorField::Types, &raw.types)?,
            args: raw.args,
        })
    }

    /// Resolves every field against `params` layered over the group's args.
    pub fn describe(&self, params: &[Param]) -> Result<Descriptor, (DescriptorField, FieldError)> {
        let ns = Namespace::new(params, &self.args);
        let render = |field, t: &Template| {
            t.render(&ns)
                .map_err(|e| (field, FieldError::Template(e)))
        };

        let widths_text = render(DescriptorField::Widths, &self.widths)?;
        let widths = parse_triple(&widths_text, |w| {
            w.parse::<i8>().ok().filter(|w| (-1..=4).contains(w))
        })
        .ok_or_else(|| {
            (
                DescriptorField::Widths,
                FieldError::BadWidths(widths_text.as_str().into()),
            )
        })?;
        let types_text = render(DescriptorField::Types, &self.types)?;
        let types = parse_triple(&types_text, |t| t.parse::<ValueType>().ok()).ok_or_else(
            || {
                (
                    DescriptorField::Types,
                    FieldError::BadTypes(types_text.as_str().into()),
                )
            },
        )?;

        Ok(Descriptor {
            symbol: render(DescriptorField::Opcode, &self.opcode)?,
            mnemonic: render(DescriptorField::Mnemonic, &self.mnemonic)?,
            opname: render(DescriptorField::Opname, &self.opname)?,
            format: self
                .format
                .as_ref()
                .map(|f| render(DescriptorField::Format, f))
                .transpose()?,
            widths,
            types,
        })
    }
}

fn parse_triple<T>(text: &str, item: impl Fn(&str) -> Option<T>) -> Option<[T; 3]> {
    let mut parts = text.split(',').map(str::trim);
    let out = [
        item(parts.next()?)?,
        item(parts.next()?)?,
        item(parts.next()?)?,
    ];
    parts.next().is_none().then_some(out)
}

/// Group specifications by name.
#[derive(Clone, Debug)]
pub struct GroupTable {
    groups: BTreeMap<Box<str>, GroupSpec>,
}

impl GroupTable {
    /// Loads a group file.
    ///
    /// ```json
    /// { "version": 1, "groups": { "load": { "opcode": "OP_LOAD_{ss+1}", ... } } }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, GroupTableError> {
        let file: GroupFile = serde_json::from_str(json).map_err(|e| GroupTableError::Json {
            message: e.to_string().into(),
        })?;
        if file.version != 1 {
            return Err(GroupTableError::UnsupportedVersion {
                version: file.version,
            });
        }
        let mut groups = BTreeMap::new();
        for (name, raw) in file.groups {
            let spec = GroupSpec::from_raw(&name, raw)?;
            groups.insert(name.into_boxed_str(), spec);
        }
        Ok(Self { groups })
    }

    /// Returns the spec for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GroupSpec> {
        self.groups.get(name)
    }

    /// Group names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|k| &**k)
    }
}

/// Resolved metadata for one opcode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    /// Enum symbol, e.g. `OP_LOAD_B_2`.
    pub symbol: String,
    /// Assembler mnemonic.
    pub mnemonic: String,
    /// Human opcode name.
    pub opname: String,
    /// Disassembly format; `None` means the opcode prints no operands.
    pub format: Option<String>,
    /// Operand component counts for a, b and c; `-1` is decided at run time.
    pub widths: [i8; 3],
    /// Operand value types for a, b and c.
    pub types: [ValueType; 3],
}

/// The resolved opcode table: a descriptor or a spare for every slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpcodeTable {
    address_width: u32,
    slots: Vec<Option<Descriptor>>,
}

impl OpcodeTable {
    /// Resolves every non-spare slot of `map` against `groups`.
    pub fn resolve(map: &OpcodeMap, groups: &GroupTable) -> Result<Self, ResolveError> {
        let mut slots = Vec::with_capacity(map.len());
        let mut symbols: HashMap<String, u32> = HashMap::new();
        for (slot, binding) in map.iter() {
            let SlotBinding::Group(binding) = binding else {
                slots.push(None);
                continue;
            };
            let spec = groups
                .get(&binding.group)
                .ok_or_else(|| ResolveError::UnknownGroup {
                    slot,
                    line: binding.line,
                    group: binding.group.clone(),
                })?;
            let descriptor =
                spec.describe(&binding.params)
                    .map_err(|(field, error)| ResolveError::Field {
                        slot,
                        group: binding.group.clone(),
                        field,
                        error,
                    })?;
            if let Some(&first) = symbols.get(&descriptor.symbol) {
                return Err(ResolveError::DuplicateSymbol {
                    symbol: descriptor.symbol.as_str().into(),
                    first,
                    slot,
                });
            }
            symbols.insert(descriptor.symbol.clone(), slot);
            slots.push(Some(descriptor));
        }
        tracing::debug!(
            slots = slots.len(),
            descriptors = symbols.len(),
            "resolved opcode table"
        );
        Ok(Self {
            address_width: map.address_width(),
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

    /// Returns `true` if the table has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the descriptor at `slot`, or `None` for spares and out-of-range slots.
    #[must_use]
    pub fn get(&self, slot: u32) -> Option<&Descriptor> {
        self.slots.get(slot as usize)?.as_ref()
    }

    /// Iterates every slot in order; spares yield `None`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Option<&Descriptor>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, d)| (i as u32, d.as_ref()))
    }

    /// Iterates the non-spare slots in order.
    pub fn descriptors(&self) -> impl Iterator<Item = (u32, &Descriptor)> {
        self.iter().filter_map(|(i, d)| Some((i, d?)))
    }

    /// Finds a descriptor by opcode symbol.
    #[must_use]
    pub fn find(&self, symbol: &str) -> Option<(u32, &Descriptor)> {
        self.descriptors().find(|(_, d)| d.symbol == symbol)
    }

    /// Number of spare slots.
    #[must_use]
    pub fn spare_count(&self) -> usize {
        self.slots.iter().filter(|d| d.is_none()).count()
    }
}
