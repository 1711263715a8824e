// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! AMF0 decoder.
//!
//! Decodes the typed value graph carried in script tag bodies. A script tag
//! body is a sequence of top-level values, conventionally an event name
//! string followed by its payload.

use super::cursor::AmfCursor;
use super::{markers, MAX_DEPTH};
use crate::core::{CodecError, Properties, Result, ScriptValue};

/// Decoder for AMF0 values.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use flvforge::core::ScriptValue;
/// use flvforge::encoding::amf::AmfDecoder;
///
/// let bytes = [0x01, 0x01, 0x05];
/// let mut decoder = AmfDecoder::new(&bytes);
/// assert_eq!(decoder.decode()?, ScriptValue::Boolean(true));
/// assert_eq!(decoder.decode()?, ScriptValue::Null);
/// assert!(decoder.is_at_end());
/// # Ok(())
/// # }
/// ```
pub struct AmfDecoder<'a> {
    cursor: AmfCursor<'a>,
    depth: usize,
}

impl<'a> AmfDecoder<'a> {
    /// Create a decoder over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: AmfCursor::new(data),
            depth: 0,
        }
    }

    /// Current byte offset into the payload.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// True when every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.cursor.is_at_end()
    }

    /// Decode one value.
    pub fn decode(&mut self) -> Result<ScriptValue> {
        let marker_pos = self.cursor.position() as u64;
        let marker = self.cursor.read_u8()?;

        match marker {
            markers::NUMBER => Ok(ScriptValue::Number(self.cursor.read_f64()?)),
            markers::BOOLEAN => Ok(ScriptValue::Boolean(self.cursor.read_u8()? != 0)),
            markers::STRING => Ok(ScriptValue::String(self.read_utf8()?)),
            markers::OBJECT => self
                .nested(|d| d.read_properties())
                .map(ScriptValue::Object),
            markers::NULL => Ok(ScriptValue::Null),
            markers::UNDEFINED => Ok(ScriptValue::Undefined),
            markers::REFERENCE => Ok(ScriptValue::Reference(self.cursor.read_u16()?)),
            markers::ECMA_ARRAY => {
                // The count is informational; the end marker terminates.
                let _count = self.cursor.read_u32()?;
                self.nested(|d| d.read_properties())
                    .map(ScriptValue::AssociativeArray)
            }
            markers::STRICT_ARRAY => {
                let count = self.cursor.read_u32()? as usize;
                // Every element needs at least its marker byte.
                if count > self.cursor.remaining() {
                    return Err(CodecError::truncated(
                        count,
                        self.cursor.remaining(),
                        self.cursor.position() as u64,
                    ));
                }
                self.nested(|d| {
                    let mut items = Vec::with_capacity(count);
                    for _ in 0..count {
                        items.push(d.decode()?);
                    }
                    Ok(items)
                })
                .map(ScriptValue::OrderedList)
            }
            markers::DATE => {
                let millis = self.cursor.read_f64()?;
                let timezone = self.cursor.read_i16()?;
                Ok(ScriptValue::Date { millis, timezone })
            }
            other => Err(CodecError::unknown_marker(other, marker_pos)),
        }
    }

    /// Decode every remaining top-level value.
    pub fn decode_remaining(&mut self) -> Result<Vec<ScriptValue>> {
        let mut values = Vec::new();
        while !self.cursor.is_at_end() {
            values.push(self.decode()?);
        }
        Ok(values)
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(CodecError::unsupported(format!(
                "AMF0 nesting deeper than {MAX_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn read_utf8(&mut self) -> Result<String> {
        let len = self.cursor.read_u16()? as usize;
        let start = self.cursor.position();
        let bytes = self.cursor.read_bytes(len)?;
        // Invalid UTF-8 is replaced; the affected string will not round-trip.
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_string()),
            Err(_) => {
                tracing::debug!(
                    context = "amf0",
                    position = start,
                    "string is not valid UTF-8, replacing invalid sequences"
                );
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }

    /// Read key/value pairs up to and including the end marker.
    fn read_properties(&mut self) -> Result<Properties> {
        let mut props = Properties::new();
        loop {
            let key = self.read_utf8()?;
            if key.is_empty() && self.cursor.peek() == Some(markers::OBJECT_END) {
                self.cursor.read_u8()?;
                return Ok(props);
            }
            if self.cursor.is_at_end() {
                return Err(CodecError::truncated(
                    1,
                    0,
                    self.cursor.position() as u64,
                ));
            }
            let value = self.decode()?;
            props.insert(key, value);
        }
    }
}

/// Decode a single value from the start of `data`.
///
/// Trailing bytes after the first value are ignored.
pub fn decode_value(data: &[u8]) -> Result<ScriptValue> {
    AmfDecoder::new(data).decode()
}

/// Decode every top-level value in `data`.
pub fn decode_all(data: &[u8]) -> Result<Vec<ScriptValue>> {
    AmfDecoder::new(data).decode_remaining()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> Vec<u8> {
        let mut out = (name.len() as u16).to_be_bytes().to_vec();
        out.extend_from_slice(name.as_bytes());
        out
    }

    #[test]
    fn test_decode_number() {
        let mut data = vec![markers::NUMBER];
        data.extend_from_slice(&29.97f64.to_be_bytes());
        assert_eq!(decode_value(&data).unwrap(), ScriptValue::Number(29.97));
    }

    #[test]
    fn test_decode_string() {
        let mut data = vec![markers::STRING];
        data.extend(key("onMetaData"));
        assert_eq!(
            decode_value(&data).unwrap(),
            ScriptValue::string("onMetaData")
        );
    }

    #[test]
    fn test_decode_ecma_array_ignores_count() {
        // Count says 5 but only one entry precedes the end marker.
        let mut data = vec![markers::ECMA_ARRAY, 0, 0, 0, 5];
        data.extend(key("width"));
        data.push(markers::NUMBER);
        data.extend_from_slice(&640f64.to_be_bytes());
        data.extend_from_slice(&[0, 0, markers::OBJECT_END]);

        let value = decode_value(&data).unwrap();
        let props = value.as_properties().unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("width").and_then(|v| v.as_f64()), Some(640.0));
    }

    #[test]
    fn test_decode_nested_object_keeps_order() {
        let mut data = vec![markers::OBJECT];
        data.extend(key("b"));
        data.extend_from_slice(&[markers::BOOLEAN, 0]);
        data.extend(key("a"));
        data.push(markers::STRICT_ARRAY);
        data.extend_from_slice(&2u32.to_be_bytes());
        data.push(markers::NULL);
        data.push(markers::UNDEFINED);
        data.extend_from_slice(&[0, 0, markers::OBJECT_END]);

        let value = decode_value(&data).unwrap();
        let props = value.as_properties().unwrap();
        let keys: Vec<_> = props.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(
            props.get("a"),
            Some(&ScriptValue::OrderedList(vec![
                ScriptValue::Null,
                ScriptValue::Undefined
            ]))
        );
    }

    #[test]
    fn test_decode_date_and_reference() {
        let mut data = vec![markers::DATE];
        data.extend_from_slice(&1000f64.to_be_bytes());
        data.extend_from_slice(&(-60i16).to_be_bytes());
        data.extend_from_slice(&[markers::REFERENCE, 0, 3]);

        let values = decode_all(&data).unwrap();
        assert_eq!(
            values,
            vec![
                ScriptValue::Date {
                    millis: 1000.0,
                    timezone: -60
                },
                ScriptValue::Reference(3)
            ]
        );
    }

    #[test]
    fn test_unknown_marker() {
        let data = [markers::NULL, 0x0c, 0, 0, 0, 0];
        let err = decode_all(&data).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnknownTypeMarker {
                marker: 0x0c,
                cursor_pos: 1
            }
        ));
    }

    #[test]
    fn test_truncated_object() {
        // Missing end marker.
        let mut data = vec![markers::OBJECT];
        data.extend(key("k"));
        data.extend_from_slice(&[markers::BOOLEAN, 1]);
        let err = decode_value(&data).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedInput { .. }));
    }

    #[test]
    fn test_truncated_number() {
        let data = [markers::NUMBER, 0x40, 0x00];
        assert!(matches!(
            decode_value(&data).unwrap_err(),
            CodecError::TruncatedInput { requested: 8, .. }
        ));
    }

    #[test]
    fn test_strict_array_count_exceeds_payload() {
        let data = [markers::STRICT_ARRAY, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            decode_value(&data).unwrap_err(),
            CodecError::TruncatedInput { .. }
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut data = Vec::new();
        for _ in 0..=MAX_DEPTH {
            data.push(markers::STRICT_ARRAY);
            data.extend_from_slice(&1u32.to_be_bytes());
        }
        data.push(markers::NULL);
        assert!(matches!(
            decode_value(&data).unwrap_err(),
            CodecError::Unsupported { .. }
        ));
    }
}
