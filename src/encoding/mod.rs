// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Script data encoding/decoding.
//!
//! - [`amf`] - AMF0 codec for the typed values carried by script tags

pub mod amf;

pub use amf::{decode_all, decode_value, encode_value, AmfDecoder, AmfEncoder};
