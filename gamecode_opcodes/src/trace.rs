// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for bitmap expansion.
//!
//! Tracing is optional and is designed to be `no_std` friendly.
//! The expander only emits events requested by a [`TraceMask`].
//!
//! To enable tracing, pass a [`TraceMask`] and [`TraceSink`] to [`OpcodeMap::expand_traced`].

#[cfg(doc)]
use crate::bitpattern::OpcodeMap;

use crate::bitpattern::Row;

/// A set of trace events requested by a [`TraceSink`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceMask(u32);

impl core::ops::BitOr for TraceMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for TraceMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl TraceMask {
    /// No tracing.
    pub const NONE: Self = Self(0);
    /// Trace row boundaries.
    ///
    /// Enables:
    /// - [`TraceSink::row_start`]
    /// - [`TraceSink::row_end`]
    pub const ROW: Self = Self(1 << 0);
    /// Trace slots whose binding is replaced by a later row.
    ///
    /// Enables:
    /// - [`TraceSink::slot_overwrite`]
    pub const OVERWRITE: Self = Self(1 << 1);

    /// Returns `true` if this mask includes all bits in `other`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// A trace sink that can receive expansion events.
pub trait TraceSink {
    /// Returns the set of events the sink wants.
    fn mask(&self) -> TraceMask {
        TraceMask::NONE
    }

    /// Called before a row is expanded.
    ///
    /// Called only if `mask()` includes [`TraceMask::ROW`].
    fn row_start(&mut self, _row: &Row) {}

    /// Called when a slot that an earlier row already bound is bound again.
    ///
    /// Called only if `mask()` includes [`TraceMask::OVERWRITE`].
    ///
    /// - `slot`: the opcode slot
    /// - `previous_line`: bitmap line of the row that bound the slot before
    /// - `row`: the row taking the slot over
    fn slot_overwrite(&mut self, _slot: u32, _previous_line: usize, _row: &Row) {}

    /// Called after a row is expanded.
    ///
    /// Called only if `mask()` includes [`TraceMask::ROW`].
    ///
    /// - `slots`: number of slots the row wrote
    fn row_end(&mut self, _row: &Row, _slots: usize) {}
}
