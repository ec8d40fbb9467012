//! Tagged values.
//!
//! [`Value`] is the closed set of shapes a row key, column or nested structure may take on
//! the wire. This module also owns the mapping between [`Value`] and the apollo
//! [`wire::Value`](crate::protocol::apollo::Value) message, in both directions.
//!
//! # Overview
//!
//! - Lists and maps recurse depth-first.
//! - An empty string or empty binary is a value in its own right, distinct from [`Value::Null`].
//! - Map keys are unique names; duplicated field names in a decoded row keep the last value.
//!
//! Rust host types convert into [`Value`] through `From`; conversions that can lose
//! information (e.g. `u64` above `i64::MAX`) go through `TryFrom` and fail locally with a
//! [`ValueError`] before anything is sent.
use std::{collections::BTreeMap, fmt};

use thiserror::Error;

use crate::protocol::apollo::{self as wire, value::Type};

/// Named values making up a key, a set of columns or a property list.
pub type Fields = BTreeMap<String, Value>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("integer {0} does not fit in a signed 64-bit value")]
    IntegerOutOfRange(u128),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Binary(Vec<u8>),
    Int(i64),
    Double(f64),
    Boolean(bool),
    Null,
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Binary(b) => {
                write!(f, "<<")?;
                for (i, byte) in b.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{byte}")?;
                }
                write!(f, ">>")
            }
            Value::Int(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d:?}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::List(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::Int(i64::from(value))
            }
        })*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! try_from_wide_int {
    ($($t:ty),*) => {
        $(impl TryFrom<$t> for Value {
            type Error = ValueError;

            fn try_from(value: $t) -> Result<Self, Self::Error> {
                i64::try_from(value)
                    .map(Value::Int)
                    .map_err(|_| ValueError::IntegerOutOfRange(value as u128))
            }
        })*
    };
}

try_from_wide_int!(u64, usize, u128);

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Double(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Binary(value.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Value> for wire::Value {
    fn from(value: Value) -> Self {
        let ty = match value {
            Value::String(s) => Type::String(s),
            Value::Binary(b) => Type::Binary(b),
            Value::Int(i) => Type::Int(i),
            Value::Double(d) => Type::Double(d),
            Value::Boolean(b) => Type::Boolean(b),
            Value::Null => Type::Null(Vec::new()),
            Value::List(values) => Type::List(wire::ListValue {
                values: values.into_iter().map(wire::Value::from).collect(),
            }),
            Value::Map(map) => Type::Map(wire::MapValue {
                values: map
                    .into_iter()
                    .map(|(k, v)| (k, wire::Value::from(v)))
                    .collect(),
            }),
        };
        wire::Value { r#type: Some(ty) }
    }
}

impl From<wire::Value> for Value {
    fn from(value: wire::Value) -> Self {
        match value.r#type {
            Some(Type::String(s)) => Value::String(s),
            Some(Type::Binary(b)) => Value::Binary(b),
            Some(Type::Int(i)) => Value::Int(i),
            Some(Type::Double(d)) => Value::Double(d),
            Some(Type::Boolean(b)) => Value::Boolean(b),
            // A value with no variant set reads as null.
            Some(Type::Null(_)) | None => Value::Null,
            Some(Type::List(list)) => {
                Value::List(list.values.into_iter().map(Value::from).collect())
            }
            Some(Type::Map(map)) => Value::Map(
                map.values
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

pub fn encode(value: Value) -> wire::Value {
    value.into()
}

pub fn decode(value: wire::Value) -> Value {
    value.into()
}

/// Encode named values as a list of wire fields, ordered by name.
pub fn encode_fields(fields: Fields) -> Vec<wire::Field> {
    fields
        .into_iter()
        .map(|(name, value)| wire::Field {
            name,
            value: Some(value.into()),
        })
        .collect()
}

pub fn decode_fields(fields: Vec<wire::Field>) -> Fields {
    fields
        .into_iter()
        .map(|f| (f.name, f.value.map_or(Value::Null, Value::from)))
        .collect()
}

/// Build [`Fields`] from `name => value` pairs.
///
/// ```rust
/// use pundun::{fields, Value};
///
/// let key = fields! { "imsi" => "240011234567890", "ts" => 7 };
/// assert_eq!(key["ts"], Value::Int(7));
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::Fields::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(fields.insert(::std::string::String::from($name), $crate::Value::from($value));)+
        fields
    }};
}
