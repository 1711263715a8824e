// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! FLV file header.

use super::constants::{
    FIRST_TRAILER_SIZE, FLAG_HAS_AUDIO, FLAG_HAS_VIDEO, FLV_SIGNATURE, HEADER_SIZE,
};
use crate::core::{CodecError, Result};

/// Fixed 9-byte file header.
///
/// The raw flags byte is kept as read so that writers reproduce reserved
/// bits unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvHeader {
    /// Format version (1 for every file seen in practice)
    pub version: u8,
    /// Raw presence flags
    pub flags: u8,
    /// Offset of the first byte after the header
    pub data_offset: u32,
}

impl Default for FlvHeader {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl FlvHeader {
    /// Create a version 1 header with the given presence flags.
    pub fn new(has_video: bool, has_audio: bool) -> Self {
        let mut flags = 0;
        if has_video {
            flags |= FLAG_HAS_VIDEO;
        }
        if has_audio {
            flags |= FLAG_HAS_AUDIO;
        }
        Self {
            version: 1,
            flags,
            data_offset: HEADER_SIZE as u32,
        }
    }

    /// Parse the fixed header bytes.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        if bytes[..3] != FLV_SIGNATURE {
            return Err(CodecError::malformed_header(format!(
                "invalid signature {}",
                hex::encode(&bytes[..3])
            )));
        }
        let data_offset = u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
        if (data_offset as usize) < HEADER_SIZE {
            return Err(CodecError::malformed_header(format!(
                "data offset {data_offset} is smaller than the header"
            )));
        }
        Ok(Self {
            version: bytes[3],
            flags: bytes[4],
            data_offset,
        })
    }

    /// Serialize the fixed header bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..3].copy_from_slice(&FLV_SIGNATURE);
        out[3] = self.version;
        out[4] = self.flags;
        out[5..].copy_from_slice(&self.data_offset.to_be_bytes());
        out
    }

    /// Whether the header announces video tags.
    pub fn has_video(&self) -> bool {
        self.flags & FLAG_HAS_VIDEO != 0
    }

    /// Whether the header announces audio tags.
    pub fn has_audio(&self) -> bool {
        self.flags & FLAG_HAS_AUDIO != 0
    }

    /// Byte position of the first tag.
    pub fn data_start(&self) -> u64 {
        u64::from(self.data_offset) + FIRST_TRAILER_SIZE as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let bytes = [b'F', b'L', b'V', 1, 0x05, 0, 0, 0, 9];
        let header = FlvHeader::parse(&bytes).unwrap();
        assert_eq!(header.version, 1);
        assert!(header.has_video());
        assert!(header.has_audio());
        assert_eq!(header.data_start(), 13);
        assert_eq!(header.to_bytes(), bytes);
    }

    #[test]
    fn test_flag_bits() {
        let video_only = FlvHeader::new(true, false);
        assert_eq!(video_only.flags, 0x04);
        let audio_only = FlvHeader::new(false, true);
        assert_eq!(audio_only.flags, 0x01);
    }

    #[test]
    fn test_bad_signature() {
        let bytes = [b'F', b'L', b'X', 1, 0x05, 0, 0, 0, 9];
        let err = FlvHeader::parse(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHeader { .. }));
        assert!(err.to_string().contains("464c58"));
    }

    #[test]
    fn test_data_offset_too_small() {
        let bytes = [b'F', b'L', b'V', 1, 0x05, 0, 0, 0, 4];
        assert!(FlvHeader::parse(&bytes).is_err());
    }

    #[test]
    fn test_reserved_flag_bits_survive() {
        let bytes = [b'F', b'L', b'V', 1, 0xFF, 0, 0, 0, 12];
        let header = FlvHeader::parse(&bytes).unwrap();
        assert_eq!(header.to_bytes(), bytes);
        assert_eq!(header.data_start(), 16);
    }
}
