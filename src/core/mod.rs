// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout flvforge.
//!
//! This module provides the foundational types for the library:
//! - [`CodecError`] - Error taxonomy shared by every stage
//! - [`ScriptValue`] - Typed value graph carried by script tags
//! - [`Properties`] - Ordered, unique-key map used by composite values

pub mod error;
pub mod value;

pub use error::{CodecError, Result};
pub use value::{Properties, ScriptValue};
