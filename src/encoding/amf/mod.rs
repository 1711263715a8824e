// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! AMF0 module.
//!
//! Binary encoding of [`ScriptValue`](crate::core::ScriptValue) graphs as
//! carried by script data tags. Every value starts with a one-byte type
//! marker followed by a marker-specific payload; all multi-byte integers and
//! doubles are big-endian.

pub mod cursor;
pub mod decoder;
pub mod encoder;

pub use cursor::AmfCursor;
pub use decoder::{decode_all, decode_value, AmfDecoder};
pub use encoder::{encode_value, AmfEncoder};

/// AMF0 type markers.
pub mod markers {
    /// Number (f64).
    pub const NUMBER: u8 = 0x00;
    /// Boolean.
    pub const BOOLEAN: u8 = 0x01;
    /// String with a 16-bit length prefix.
    pub const STRING: u8 = 0x02;
    /// Anonymous object.
    pub const OBJECT: u8 = 0x03;
    /// Null.
    pub const NULL: u8 = 0x05;
    /// Undefined.
    pub const UNDEFINED: u8 = 0x06;
    /// Reference to a previously decoded complex value.
    pub const REFERENCE: u8 = 0x07;
    /// ECMA (associative) array.
    pub const ECMA_ARRAY: u8 = 0x08;
    /// Terminates an object or ECMA array, preceded by an empty key.
    pub const OBJECT_END: u8 = 0x09;
    /// Strict (ordered) array.
    pub const STRICT_ARRAY: u8 = 0x0A;
    /// Date.
    pub const DATE: u8 = 0x0B;
}

/// Deepest composite nesting accepted by the decoder.
pub const MAX_DEPTH: usize = 64;
