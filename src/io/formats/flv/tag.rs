// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Raw tag envelope.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::constants::{
    TAG_HEADER_SIZE, TAG_TRAILER_SIZE, TAG_TYPE_AUDIO, TAG_TYPE_SCRIPT, TAG_TYPE_VIDEO,
};

/// Kind of payload carried by a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Audio,
    Video,
    /// Script data; `meta` in option strings and file names.
    Meta,
}

impl TagType {
    /// All tag types in wire order of their type bytes.
    pub const ALL: [TagType; 3] = [TagType::Audio, TagType::Video, TagType::Meta];

    /// Map a type byte to a tag type.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TAG_TYPE_AUDIO => Some(TagType::Audio),
            TAG_TYPE_VIDEO => Some(TagType::Video),
            TAG_TYPE_SCRIPT => Some(TagType::Meta),
            _ => None,
        }
    }

    /// The type byte written on the wire.
    pub fn as_byte(self) -> u8 {
        match self {
            TagType::Audio => TAG_TYPE_AUDIO,
            TagType::Video => TAG_TYPE_VIDEO,
            TagType::Meta => TAG_TYPE_SCRIPT,
        }
    }

    /// Lowercase name used in option strings.
    pub fn name(self) -> &'static str {
        match self {
            TagType::Audio => "audio",
            TagType::Video => "video",
            TagType::Meta => "meta",
        }
    }

    /// Parse a lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "audio" => Some(TagType::Audio),
            "video" => Some(TagType::Video),
            "meta" => Some(TagType::Meta),
            _ => None,
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One length-framed record as read from or written to a container.
///
/// Only [`Tag::dts`] may change between read and write; every other field
/// round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub tag_type: TagType,
    /// Decode timestamp in milliseconds
    pub dts: u32,
    /// Substream id, 0 for the primary stream
    pub stream_id: u32,
    pub body: Vec<u8>,
    /// Byte offset of the tag header in the source (0 for synthesized tags)
    pub position: u64,
    /// Trailer value read after the body
    pub trailer: u32,
}

impl Tag {
    /// Create a tag that did not come from a file.
    pub fn new(tag_type: TagType, dts: u32, stream_id: u32, body: Vec<u8>) -> Self {
        let trailer = (TAG_HEADER_SIZE + body.len()) as u32;
        Self {
            tag_type,
            dts,
            stream_id,
            body,
            position: 0,
            trailer,
        }
    }

    /// Size of the body in bytes.
    pub fn body_size(&self) -> usize {
        self.body.len()
    }

    /// Header plus body plus trailer: the bytes this tag occupies on disk.
    pub fn framed_size(&self) -> u64 {
        framed_size(self.body.len())
    }

    /// Byte offset just past this tag's trailer.
    pub fn end_position(&self) -> u64 {
        self.position + self.framed_size()
    }
}

/// On-disk size of a tag with a body of `body_len` bytes.
pub fn framed_size(body_len: usize) -> u64 {
    (TAG_HEADER_SIZE + body_len + TAG_TRAILER_SIZE) as u64
}
