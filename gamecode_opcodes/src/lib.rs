// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `gamecode_opcodes`: declarative opcode-space compilers for the Ruamoko VM.
//!
//! A bitmap of bit-pattern rows partitions the opcode space into slots bound
//! to named groups ([`bitpattern`]). Each group's templates ([`template`],
//! [`group`]) resolve a slot's bindings into an instruction descriptor, and
//! [`emit`] renders the descriptors as the C opcode enum or the opcode table.
//! The [`families`] generators produce the literal dispatch code for the
//! conversion, extend, hops and swizzle instructions.
//!
//! ## Example
//!
//! ```
//! use gamecode_opcodes::emit::{EnumOptions, render_enum};
//!
//! let table = gamecode_opcodes::build_default_table()?;
//! assert_eq!(table.len(), 512);
//! let text = render_enum(&table, EnumOptions::default());
//! assert!(text.starts_with("OP_LOAD_E_1,"));
//! # Ok::<(), gamecode_opcodes::BuildError>(())
//! ```

#![no_std]

extern crate alloc;

use core::fmt;

pub mod bitpattern;
pub mod emit;
pub mod families;
pub mod group;
pub mod template;
pub mod trace;
pub mod value_type;

use bitpattern::{BitPatternError, Bitmap, OpcodeMap};
use group::{GroupTable, GroupTableError, OpcodeTable, ResolveError};

/// Address width of the main opcode table.
pub const MAIN_ADDRESS_WIDTH: u32 = 9;

/// The main-table bitmap.
pub const DEFAULT_BITMAP: &str = include_str!("../opcodes.txt");

/// Group specifications for [`DEFAULT_BITMAP`].
pub const DEFAULT_GROUPS: &str = include_str!("../groups.json");

/// Any failure building an [`OpcodeTable`] from text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// The bitmap did not parse or expand.
    Bitmap(BitPatternError),
    /// The group file did not load.
    Groups(GroupTableError),
    /// A slot did not resolve.
    Resolve(ResolveError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bitmap(e) => write!(f, "bitmap: {e}"),
            Self::Groups(e) => write!(f, "groups: {e}"),
            Self::Resolve(e) => write!(f, "resolve: {e}"),
        }
    }
}

impl core::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Bitmap(e) => Some(e),
            Self::Groups(e) => Some(e),
            Self::Resolve(e) => Some(e),
        }
    }
}

impl From<BitPatternError> for BuildError {
    fn from(e: BitPatternError) -> Self {
        Self::Bitmap(e)
    }
}

impl From<GroupTableError> for BuildError {
    fn from(e: GroupTableError) -> Self {
        Self::Groups(e)
    }
}

impl From<ResolveError> for BuildError {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

/// Parses, expands and resolves `bitmap` against `groups`.
pub fn build_table(
    bitmap: &str,
    groups: &str,
    address_width: u32,
) -> Result<OpcodeTable, BuildError> {
    let bitmap = Bitmap::parse(bitmap, address_width)?;
    let groups = GroupTable::from_json(groups)?;
    let map = OpcodeMap::expand(&bitmap)?;
    Ok(OpcodeTable::resolve(&map, &groups)?)
}

/// Builds the main opcode table from the embedded configuration.
pub fn build_default_table() -> Result<OpcodeTable, BuildError> {
    build_table(DEFAULT_BITMAP, DEFAULT_GROUPS, MAIN_ADDRESS_WIDTH)
}
