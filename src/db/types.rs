//! Row and value types for db-envelope.
//!
//! `RawValue` is what a connection provider hands out for a cell; `Value` is
//! the closed set the row decoder produces from it.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A cell as surfaced by the connection provider, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// SQL NULL.
    Null,

    /// Untyped wire data (text-format cells); numeric content is sniffed.
    Bytes(Vec<u8>),

    /// Native 64-bit signed integer.
    Int(i64),

    /// Native 64-bit floating point number.
    Float(f64),

    /// Native string.
    Text(String),

    /// Any other native type, identified by name.
    Other(String),
}

impl RawValue {
    /// Returns the name of the provider-level type, for diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bytes(_) => "bytes",
            Self::Int(_) => "int64",
            Self::Float(_) => "float64",
            Self::Text(_) => "string",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Bytes(v.as_bytes().to_vec())
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl<T> From<Option<T>> for RawValue
where
    T: Into<RawValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => RawValue::Null,
        }
    }
}

/// A decoded cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Signed integer (up to i64).
    Integer(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    Text(String),
}

impl Value {
    /// Converts the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

// JSON number, string or null; no variant tag on the wire.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// One decoded row: values keyed by column name, in column order.
///
/// All rows decoded from one cursor share the same column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from a shared column list and its values.
    ///
    /// Returns `None` if the value count does not match the column count.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Option<Self> {
        (columns.len() == values.len()).then_some(Self { columns, values })
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Gets a value by column name, returning None if not found.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Iterates over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// A JSON object keyed by column name, keys emitted in column order.
impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Decoded rows of one statement execution, in cursor order.
pub type ResultSet = Vec<Row>;
