// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Big-endian read cursor over an AMF0 payload.

use crate::core::{CodecError, Result};

/// Cursor that tracks the read position in an AMF0 payload.
///
/// Every read is bounds-checked and fails with
/// [`CodecError::TruncatedInput`] instead of panicking.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use flvforge::encoding::amf::AmfCursor;
///
/// let data = [0x00, 0x03, b'a', b'b', b'c'];
/// let mut cursor = AmfCursor::new(&data);
/// assert_eq!(cursor.read_u16()?, 3);
/// assert_eq!(cursor.read_bytes(3)?, b"abc");
/// assert!(cursor.is_at_end());
/// # Ok(())
/// # }
/// ```
pub struct AmfCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AmfCursor<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Get the current position.
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Get the remaining bytes available to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Check if at end of buffer.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.remaining() < N {
            return Err(CodecError::truncated(
                N,
                self.remaining(),
                self.offset as u64,
            ));
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Read a u16 value.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take()?))
    }

    /// Read an i16 value.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.take()?))
    }

    /// Read a u32 value.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    /// Read an f64 value.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.take()?))
    }

    /// Read a byte slice.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(CodecError::truncated(
                count,
                self.remaining(),
                self.offset as u64,
            ));
        }
        let start = self.offset;
        self.offset += count;
        Ok(&self.data[start..self.offset])
    }

    /// Peek at the next byte without advancing the position.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives_big_endian() {
        let mut data = vec![0x7f, 0x01, 0x02, 0xff, 0xfe, 0x00, 0x00, 0x01, 0x00];
        data.extend_from_slice(&1.5f64.to_be_bytes());
        let mut cursor = AmfCursor::new(&data);

        assert_eq!(cursor.read_u8().unwrap(), 0x7f);
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_u32().unwrap(), 256);
        assert_eq!(cursor.read_f64().unwrap(), 1.5);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_truncated_read_reports_position() {
        let data = [0x00, 0x01, 0x02];
        let mut cursor = AmfCursor::new(&data);
        cursor.read_u8().unwrap();

        let err = cursor.read_u32().unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedInput {
                requested: 4,
                available: 2,
                cursor_pos: 1
            }
        ));
        // Failed reads do not advance.
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_peek() {
        let data = [0x09];
        let mut cursor = AmfCursor::new(&data);
        assert_eq!(cursor.peek(), Some(0x09));
        cursor.read_u8().unwrap();
        assert_eq!(cursor.peek(), None);
    }

    #[test]
    fn test_read_bytes_out_of_bounds() {
        let data = [1, 2];
        let mut cursor = AmfCursor::new(&data);
        assert!(cursor.read_bytes(3).is_err());
        assert_eq!(cursor.read_bytes(2).unwrap(), &[1, 2]);
    }
}
