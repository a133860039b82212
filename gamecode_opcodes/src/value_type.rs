// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! VM operand value types.

use core::fmt;
use core::str::FromStr;

/// Operand value type, rendered with its `ev_*` name.
#[allow(missing_docs, reason = "one variant per VM type tag")]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Void,
    String,
    Float,
    Vector,
    Entity,
    Field,
    Func,
    Pointer,
    Quaternion,
    Integer,
    Uinteger,
    Short,
    Double,
    Long,
    Ulong,
    Ushort,
    /// No operand in this position.
    Invalid,
}

impl ValueType {
    /// Every value type, in VM tag order.
    pub const ALL: [Self; 17] = [
        Self::Void,
        Self::String,
        Self::Float,
        Self::Vector,
        Self::Entity,
        Self::Field,
        Self::Func,
        Self::Pointer,
        Self::Quaternion,
        Self::Integer,
        Self::Uinteger,
        Self::Short,
        Self::Double,
        Self::Long,
        Self::Ulong,
        Self::Ushort,
        Self::Invalid,
    ];

    /// The `ev_*` identifier used by the VM headers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Void => "ev_void",
            Self::String => "ev_string",
            Self::Float => "ev_float",
            Self::Vector => "ev_vector",
            Self::Entity => "ev_entity",
            Self::Field => "ev_field",
            Self::Func => "ev_func",
            Self::Pointer => "ev_pointer",
            Self::Quaternion => "ev_quaternion",
            Self::Integer => "ev_integer",
            Self::Uinteger => "ev_uinteger",
            Self::Short => "ev_short",
            Self::Double => "ev_double",
            Self::Long => "ev_long",
            Self::Ulong => "ev_ulong",
            Self::Ushort => "ev_ushort",
            Self::Invalid => "ev_invalid",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a name is not an `ev_*` type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownValueType;

impl fmt::Display for UnknownValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value type")
    }
}

impl core::error::Error for UnknownValueType {}

impl FromStr for ValueType {
    type Err = UnknownValueType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or(UnknownValueType)
    }
}
