//! Dynamic values and query-time type coercion.
//!
//! Every source ultimately produces one of a small set of raw value kinds:
//! strings (environment, configuration files, most arguments), booleans
//! (`store_true`/`store_false` flags), integers (`count` flags), and lists
//! (`append` arguments). [`Value`] is the carrier for those kinds plus the
//! absence sentinel; [`FromValue`] converts the winning raw value into the
//! caller's type when the parameter is queried.

use core::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A raw parameter value, as produced by a source before coercion.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No source produced a value and no default was declared.
    #[default]
    Absent,
    /// A string value.
    Str(String),
    /// A boolean value (from `store_true`/`store_false` flags).
    Bool(bool),
    /// An integer value (from `count` flags).
    Int(i64),
    /// A list of strings (from `append` arguments).
    List(Vec<String>),
}

impl Value {
    /// Whether this is the absence sentinel.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// A typed coercion failure: the raw value could not be converted into the
/// requested target type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("cannot coerce `{value}` into {target}")]
pub struct CoercionError {
    value: String,
    target: &'static str,
}

impl CoercionError {
    pub(crate) fn new(value: &Value, target: &'static str) -> Self {
        Self {
            value: value.to_string(),
            target,
        }
    }

    /// Name of the type the coercion targeted.
    pub fn target(&self) -> &'static str {
        self.target
    }
}

/// Conversion from a raw [`Value`] into a caller-facing type.
///
/// Implementations exist for the types the sources can meaningfully carry:
/// strings, booleans, the common integer widths, floats, paths, and string
/// lists. Strings are parsed; kind mismatches (e.g. a list where a scalar is
/// expected) fail with a [`CoercionError`].
pub trait FromValue: Sized {
    /// Convert the raw value, failing with a typed error.
    fn from_value(value: &Value) -> Result<Self, CoercionError>;
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Absent | Value::List(_) => Err(CoercionError::new(value, "String")),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(CoercionError::new(value, "bool")),
            },
            Value::Absent | Value::List(_) => Err(CoercionError::new(value, "bool")),
        }
    }
}

macro_rules! impl_from_value_for_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, CoercionError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(*i)
                            .map_err(|_| CoercionError::new(value, stringify!($ty))),
                        Value::Str(s) => s
                            .trim()
                            .parse()
                            .map_err(|_| CoercionError::new(value, stringify!($ty))),
                        _ => Err(CoercionError::new(value, stringify!($ty))),
                    }
                }
            }
        )*
    };
}

impl_from_value_for_int!(i16, i32, i64, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        match value {
            Value::Int(i) => Ok(*i as f64),
            Value::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| CoercionError::new(value, "f64")),
            _ => Err(CoercionError::new(value, "f64")),
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        match value {
            Value::Str(s) => Ok(PathBuf::from(s)),
            _ => Err(CoercionError::new(value, "PathBuf")),
        }
    }
}

impl FromValue for Vec<String> {
    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        match value {
            Value::List(items) => Ok(items.clone()),
            // A scalar from a lower-precedence source stands in for a
            // single-element list.
            Value::Str(s) => Ok(vec![s.clone()]),
            _ => Err(CoercionError::new(value, "Vec<String>")),
        }
    }
}
