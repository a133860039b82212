// Copyright 2026 the Gamecode Opcodes Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conformance tests for `gamecode_opcodes` live in `tests/`.
