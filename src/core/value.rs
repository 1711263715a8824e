// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Script data value type system.
//!
//! Provides the typed value graph carried by script (metadata) tags. All
//! variants are serde-serializable.
//!
//! # Ordering
//!
//! Composite maps ([`ScriptValue::Object`] and
//! [`ScriptValue::AssociativeArray`]) keep their entries in insertion order
//! and never hold the same key twice. The encoder walks entries in that order,
//! so a logical value always has exactly one byte encoding. Metadata
//! regeneration relies on this when it computes size deltas.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered string-keyed map with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    entries: Vec<(String, ScriptValue)>,
}

impl Properties {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value.
    ///
    /// Replacing an existing key keeps its original position and returns the
    /// previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: ScriptValue) -> Option<ScriptValue> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: ScriptValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&ScriptValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a mutable value by key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ScriptValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScriptValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ScriptValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, ScriptValue)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

/// Value carried in a script data tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptValue {
    // IEEE-754 double
    Number(f64),

    Boolean(bool),

    // UTF-8 string, at most 65535 bytes on the wire
    String(String),

    // Anonymous object
    Object(Properties),

    // ECMA array: map with an informational element count on the wire
    AssociativeArray(Properties),

    // Strict array
    OrderedList(Vec<ScriptValue>),

    /// Milliseconds since the Unix epoch plus a timezone offset in minutes
    Date { millis: f64, timezone: i16 },

    Null,

    Undefined,

    /// Index into the table of previously decoded complex values
    Reference(u16),
}

impl ScriptValue {
    /// Create a string value.
    pub fn string(value: impl Into<String>) -> Self {
        ScriptValue::String(value.into())
    }

    /// Try to get the inner number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the inner boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the inner string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Entries of an Object or AssociativeArray.
    pub fn as_properties(&self) -> Option<&Properties> {
        match self {
            ScriptValue::Object(p) | ScriptValue::AssociativeArray(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable entries of an Object or AssociativeArray.
    pub fn as_properties_mut(&mut self) -> Option<&mut Properties> {
        match self {
            ScriptValue::Object(p) | ScriptValue::AssociativeArray(p) => Some(p),
            _ => None,
        }
    }

    /// Try to get the inner list.
    pub fn as_list(&self) -> Option<&[ScriptValue]> {
        match self {
            ScriptValue::OrderedList(items) => Some(items),
            _ => None,
        }
    }

    /// Get the type name of this value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Number(_) => "number",
            ScriptValue::Boolean(_) => "boolean",
            ScriptValue::String(_) => "string",
            ScriptValue::Object(_) => "object",
            ScriptValue::AssociativeArray(_) => "ecma-array",
            ScriptValue::OrderedList(_) => "strict-array",
            ScriptValue::Date { .. } => "date",
            ScriptValue::Null => "null",
            ScriptValue::Undefined => "undefined",
            ScriptValue::Reference(_) => "reference",
        }
    }

    /// Convert into a JSON value for machine-readable output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ScriptValue::Number(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ScriptValue::Boolean(v) => serde_json::Value::Bool(*v),
            ScriptValue::String(s) => serde_json::Value::String(s.clone()),
            ScriptValue::Object(p) | ScriptValue::AssociativeArray(p) => serde_json::Value::Object(
                p.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect(),
            ),
            ScriptValue::OrderedList(items) => {
                serde_json::Value::Array(items.iter().map(ScriptValue::to_json).collect())
            }
            ScriptValue::Date { millis, .. } => serde_json::Value::String(format_date(*millis)),
            ScriptValue::Null | ScriptValue::Undefined => serde_json::Value::Null,
            ScriptValue::Reference(idx) => serde_json::Value::from(*idx),
        }
    }
}

fn format_date(millis: f64) -> String {
    match chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis as i64) {
        Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        None => format!("{millis}ms"),
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Number(v) => write!(f, "{v}"),
            ScriptValue::Boolean(v) => write!(f, "{v}"),
            ScriptValue::String(v) => write!(f, "{v}"),
            ScriptValue::Object(p) | ScriptValue::AssociativeArray(p) => {
                write!(f, "{{")?;
                for (i, (k, v)) in p.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            ScriptValue::OrderedList(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            ScriptValue::Date { millis, .. } => write!(f, "{}", format_date(*millis)),
            ScriptValue::Null => write!(f, "null"),
            ScriptValue::Undefined => write!(f, "undefined"),
            ScriptValue::Reference(idx) => write!(f, "ref#{idx}"),
        }
    }
}
