// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! FLV container constants.
//!
//! Single source of truth for the byte layout shared by the reader and the
//! writer.

/// File signature at offset 0.
pub const FLV_SIGNATURE: [u8; 3] = *b"FLV";

/// Size of the fixed file header.
pub const HEADER_SIZE: usize = 9;

/// Size of the zero trailer that follows the file header.
pub const FIRST_TRAILER_SIZE: usize = 4;

/// Size of a tag header: type, body size, DTS, DTS extension, substream id.
pub const TAG_HEADER_SIZE: usize = 11;

/// Size of the previous-tag-size trailer after each tag body.
pub const TAG_TRAILER_SIZE: usize = 4;

/// Largest value representable in a 24-bit field.
pub const MAX_U24: u32 = 0x00FF_FFFF;

/// Header flag bit announcing audio tags.
pub const FLAG_HAS_AUDIO: u8 = 0x01;

/// Header flag bit announcing video tags.
pub const FLAG_HAS_VIDEO: u8 = 0x04;

// Tag type bytes

/// Audio tag.
pub const TAG_TYPE_AUDIO: u8 = 8;
/// Video tag.
pub const TAG_TYPE_VIDEO: u8 = 9;
/// Script data (metadata) tag.
pub const TAG_TYPE_SCRIPT: u8 = 18;

/// Event name of the canonical metadata script tag.
pub const ON_METADATA: &str = "onMetaData";
