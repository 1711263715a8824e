// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! AMF0 encoder.
//!
//! The exact inverse of the decoder. Composite entries are written in their
//! stored order, so a value always produces the same bytes.

use byteorder::{BigEndian, WriteBytesExt};

use super::{markers, MAX_DEPTH};
use crate::core::{CodecError, Properties, Result, ScriptValue};

const CODEC: &str = "AMF0";

/// Encoder that appends AMF0 values to an output buffer.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use flvforge::core::ScriptValue;
/// use flvforge::encoding::amf::AmfEncoder;
///
/// let mut encoder = AmfEncoder::new();
/// encoder.encode(&ScriptValue::string("onMetaData"))?;
/// let bytes = encoder.finish();
/// assert_eq!(bytes[0], 0x02);
/// assert_eq!(bytes.len(), 1 + 2 + 10);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct AmfEncoder {
    buffer: Vec<u8>,
    depth: usize,
}

impl AmfEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the encoder and return the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    /// Append one value.
    pub fn encode(&mut self, value: &ScriptValue) -> Result<()> {
        match value {
            ScriptValue::Number(v) => {
                self.buffer.write_u8(markers::NUMBER)?;
                self.buffer.write_f64::<BigEndian>(*v)?;
            }
            ScriptValue::Boolean(v) => {
                self.buffer.write_u8(markers::BOOLEAN)?;
                self.buffer.write_u8(u8::from(*v))?;
            }
            ScriptValue::String(s) => {
                self.buffer.write_u8(markers::STRING)?;
                self.write_utf8(s)?;
            }
            ScriptValue::Object(props) => {
                self.buffer.write_u8(markers::OBJECT)?;
                self.nested(|e| e.write_properties(props))?;
            }
            ScriptValue::AssociativeArray(props) => {
                self.buffer.write_u8(markers::ECMA_ARRAY)?;
                let count = u32::try_from(props.len()).map_err(|_| {
                    CodecError::encode(CODEC, "associative array has too many entries")
                })?;
                self.buffer.write_u32::<BigEndian>(count)?;
                self.nested(|e| e.write_properties(props))?;
            }
            ScriptValue::OrderedList(items) => {
                self.buffer.write_u8(markers::STRICT_ARRAY)?;
                let count = u32::try_from(items.len())
                    .map_err(|_| CodecError::encode(CODEC, "list has too many elements"))?;
                self.buffer.write_u32::<BigEndian>(count)?;
                self.nested(|e| items.iter().try_for_each(|item| e.encode(item)))?;
            }
            ScriptValue::Date { millis, timezone } => {
                self.buffer.write_u8(markers::DATE)?;
                self.buffer.write_f64::<BigEndian>(*millis)?;
                self.buffer.write_i16::<BigEndian>(*timezone)?;
            }
            ScriptValue::Null => self.buffer.write_u8(markers::NULL)?,
            ScriptValue::Undefined => self.buffer.write_u8(markers::UNDEFINED)?,
            ScriptValue::Reference(idx) => {
                self.buffer.write_u8(markers::REFERENCE)?;
                self.buffer.write_u16::<BigEndian>(*idx)?;
            }
        }
        Ok(())
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
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

    fn write_utf8(&mut self, s: &str) -> Result<()> {
        let len = u16::try_from(s.len()).map_err(|_| {
            CodecError::encode(
                CODEC,
                format!("string of {} bytes exceeds 65535", s.len()),
            )
        })?;
        self.buffer.write_u16::<BigEndian>(len)?;
        self.buffer.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn write_properties(&mut self, props: &Properties) -> Result<()> {
        for (key, value) in props.iter() {
            self.write_utf8(key)?;
            self.encode(value)?;
        }
        self.buffer.extend_from_slice(&[0, 0, markers::OBJECT_END]);
        Ok(())
    }
}

/// Encode a single value into a fresh buffer.
pub fn encode_value(value: &ScriptValue) -> Result<Vec<u8>> {
    let mut encoder = AmfEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.finish())
}
