//! Typed key/value attributes attached to a log call
//!
//! A [`Field`] is a key plus a [`FieldValue`]. Values are a closed set of
//! kinds; structured kinds (`Object`, `Array`, `Reflected`) carry a
//! `serde_json::Value` produced when the field is built.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Shared, type-erased error carried by an `Error` field
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Integer value tagged with its width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integer {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
}

impl Integer {
    /// Width name used when rendering (`i64`, `u8`, ...)
    pub fn kind(&self) -> &'static str {
        match self {
            Integer::I8(_) => "i8",
            Integer::I16(_) => "i16",
            Integer::I32(_) => "i32",
            Integer::I64(_) => "i64",
            Integer::Isize(_) => "isize",
            Integer::U8(_) => "u8",
            Integer::U16(_) => "u16",
            Integer::U32(_) => "u32",
            Integer::U64(_) => "u64",
            Integer::Usize(_) => "usize",
        }
    }

    pub fn as_i128(&self) -> i128 {
        match *self {
            Integer::I8(v) => v.into(),
            Integer::I16(v) => v.into(),
            Integer::I32(v) => v.into(),
            Integer::I64(v) => v.into(),
            Integer::Isize(v) => v as i128,
            Integer::U8(v) => v.into(),
            Integer::U16(v) => v.into(),
            Integer::U32(v) => v.into(),
            Integer::U64(v) => v.into(),
            Integer::Usize(v) => v as i128,
        }
    }

    fn to_json_value(self) -> serde_json::Value {
        match self {
            Integer::U64(v) => v.into(),
            Integer::Usize(v) => (v as u64).into(),
            other => (other.as_i128() as i64).into(),
        }
    }
}

macro_rules! impl_integer_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Integer {
                fn from(v: $ty) -> Self {
                    Integer::$variant(v)
                }
            }
        )*
    };
}

impl_integer_from!(
    i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize,
);

/// Floating-point value tagged with its width
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Float {
    F32(f32),
    F64(f64),
}

impl Float {
    pub fn kind(&self) -> &'static str {
        match self {
            Float::F32(_) => "f32",
            Float::F64(_) => "f64",
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Float::F32(v) => v.into(),
            Float::F64(v) => v,
        }
    }
}

impl From<f32> for Float {
    fn from(v: f32) -> Self {
        Float::F32(v)
    }
}

impl From<f64> for Float {
    fn from(v: f64) -> Self {
        Float::F64(v)
    }
}

/// Kind discriminant of a [`FieldValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Int,
    Float,
    Bool,
    Duration,
    Time,
    Bytes,
    Binary,
    Object,
    Array,
    Reflected,
    Error,
}

/// Value of a structured logging field
#[derive(Debug, Clone)]
pub enum FieldValue {
    String(String),
    Int(Integer),
    Float(Float),
    Bool(bool),
    Duration(Duration),
    Time(DateTime<Utc>),
    /// Byte string, rendered as text
    Bytes(Vec<u8>),
    /// Opaque binary, rendered as base64
    Binary(Vec<u8>),
    Object(serde_json::Value),
    Array(serde_json::Value),
    Reflected(serde_json::Value),
    Error(SharedError),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Duration(_) => FieldKind::Duration,
            FieldValue::Time(_) => FieldKind::Time,
            FieldValue::Bytes(_) => FieldKind::Bytes,
            FieldValue::Binary(_) => FieldKind::Binary,
            FieldValue::Object(_) => FieldKind::Object,
            FieldValue::Array(_) => FieldKind::Array,
            FieldValue::Reflected(_) => FieldKind::Reflected,
            FieldValue::Error(_) => FieldKind::Error,
        }
    }

    /// String payload, if this is a `String` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Int(i) => i.to_json_value(),
            FieldValue::Float(f) => {
                let v = f.as_f64();
                serde_json::Number::from_f64(v)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(v.to_string()))
            }
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Duration(d) => serde_json::Number::from_f64(d.as_secs_f64())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Time(t) => {
                Value::String(t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
            }
            FieldValue::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            FieldValue::Binary(b) => Value::String(BASE64.encode(b)),
            FieldValue::Object(v) | FieldValue::Array(v) | FieldValue::Reflected(v) => v.clone(),
            FieldValue::Error(e) => Value::String(e.to_string()),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => a == b,
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => a == b,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Duration(a), FieldValue::Duration(b)) => a == b,
            (FieldValue::Time(a), FieldValue::Time(b)) => a == b,
            (FieldValue::Bytes(a), FieldValue::Bytes(b)) => a == b,
            (FieldValue::Binary(a), FieldValue::Binary(b)) => a == b,
            (FieldValue::Object(a), FieldValue::Object(b)) => a == b,
            (FieldValue::Array(a), FieldValue::Array(b)) => a == b,
            (FieldValue::Reflected(a), FieldValue::Reflected(b)) => a == b,
            (FieldValue::Error(a), FieldValue::Error(b)) => {
                Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Error(e) => write!(f, "{}", e),
            FieldValue::Duration(d) => write!(f, "{:?}", d),
            other => write!(f, "{}", other.to_json_value()),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(Integer::I64(i))
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(Integer::I32(i))
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        FieldValue::Int(Integer::U64(i))
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(Float::F64(f))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Duration> for FieldValue {
    fn from(d: Duration) -> Self {
        FieldValue::Duration(d)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Time(t)
    }
}

/// A single key/value attribute of a log call
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::String(value.into()))
    }

    pub fn int(key: impl Into<String>, value: impl Into<Integer>) -> Self {
        Self::new(key, FieldValue::Int(value.into()))
    }

    pub fn float(key: impl Into<String>, value: impl Into<Float>) -> Self {
        Self::new(key, FieldValue::Float(value.into()))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(key, FieldValue::Time(value))
    }

    pub fn bytes(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, FieldValue::Bytes(value.into()))
    }

    pub fn binary(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, FieldValue::Binary(value.into()))
    }

    /// Object field from any serializable value.
    ///
    /// If serialization fails the field degrades to a `<key>Error` string
    /// field carrying the serializer message.
    pub fn object<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Self {
        Self::structured(key.into(), value, FieldValue::Object)
    }

    pub fn array<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Self {
        Self::structured(key.into(), value, FieldValue::Array)
    }

    pub fn reflect<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Self {
        Self::structured(key.into(), value, FieldValue::Reflected)
    }

    fn structured<T: Serialize + ?Sized>(
        key: String,
        value: &T,
        wrap: fn(serde_json::Value) -> FieldValue,
    ) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Self { key, value: wrap(v) },
            Err(e) => Self {
                key: format!("{}Error", key),
                value: FieldValue::String(e.to_string()),
            },
        }
    }

    /// Error field under the conventional `error` key
    pub fn error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::named_error("error", err)
    }

    pub fn named_error<E>(key: impl Into<String>, err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new(key, FieldValue::Error(Arc::new(err)))
    }

    pub fn shared_error(key: impl Into<String>, err: SharedError) -> Self {
        Self::new(key, FieldValue::Error(err))
    }
}
