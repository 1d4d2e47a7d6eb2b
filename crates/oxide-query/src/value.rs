//! SQL values and conversions between Rust types and stored values.
//!
//! Every literal is captured as a [`SqlValue`] at the point it enters a
//! statement, so formatting never inspects an opaque value at render time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{QueryError, Result};

/// A SQL value that can be used as a parameter or literal.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Exact decimal value.
    Decimal(Decimal),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Date and time without time zone.
    Timestamp(NaiveDateTime),
}

/// Type tag of a [`SqlValue`], used when declaring provider parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// NULL without a type.
    Null,
    /// Boolean.
    Bool,
    /// 64-bit integer.
    Int,
    /// Double precision float.
    Float,
    /// Exact decimal.
    Decimal,
    /// Text.
    Text,
    /// Binary.
    Blob,
    /// Timestamp.
    Timestamp,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "NULL",
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

impl SqlValue {
    /// Returns the type tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::Text(_) => ValueKind::Text,
            Self::Blob(_) => ValueKind::Blob,
            Self::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    /// Returns true for NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Values that are always written inline instead of as placeholders.
    #[must_use]
    pub const fn is_inlineable(&self) -> bool {
        matches!(self, Self::Null | Self::Bool(_) | Self::Int(_))
    }

    /// Converts the value into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Conversion`] if the value cannot represent `T`.
    pub fn get<T: FromSqlValue>(&self) -> Result<T> {
        T::from_sql_value(self)
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

/// Trait for types that can be read back from SQL values.
///
/// Plain types read NULL as their neutral value (`0`, `false`, empty text),
/// `Option<T>` reads it as `None`.
pub trait FromSqlValue: Sized {
    /// Converts a stored value.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Conversion`] if the value has an incompatible kind.
    fn from_sql_value(value: &SqlValue) -> Result<Self>;
}

/// A Rust type usable as the value type of a typed column.
pub trait SqlType: ToSqlValue + FromSqlValue + 'static {
    /// The value kind providers use for parameters of this type.
    const KIND: ValueKind;
}

fn mismatch<T>(expected: &'static str, value: &SqlValue) -> Result<T> {
    Err(QueryError::Conversion {
        expected,
        found: value.kind(),
    })
}

/// Interprets a stored value as a boolean, NULL-aware.
///
/// Text is compared case-insensitively against `true`, `t`, `yes`, `y` and `1`.
#[must_use]
pub fn truthy(value: &SqlValue) -> Option<bool> {
    match value {
        SqlValue::Null => None,
        SqlValue::Bool(b) => Some(*b),
        SqlValue::Int(n) => Some(*n != 0),
        SqlValue::Float(f) => Some(*f != 0.0),
        SqlValue::Decimal(d) => Some(!d.is_zero()),
        SqlValue::Text(text) => Some(matches!(
            text.trim().to_lowercase().as_str(),
            "true" | "t" | "yes" | "y" | "1"
        )),
        SqlValue::Blob(bytes) => Some(bytes.iter().any(|b| *b != 0)),
        SqlValue::Timestamp(_) => None,
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for Decimal {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Decimal(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        self.map_or(SqlValue::Null, ToSqlValue::to_sql_value)
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Timestamp(_) => mismatch("bool", value),
            other => Ok(truthy(other).unwrap_or(false)),
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(0),
            SqlValue::Int(n) => Ok(*n),
            SqlValue::Bool(b) => Ok(Self::from(*b)),
            SqlValue::Float(f) if f.is_finite() => {
                #[allow(clippy::cast_possible_truncation)]
                let n = f.round() as Self;
                Ok(n)
            }
            SqlValue::Decimal(d) => d.round().to_i64().map_or_else(|| mismatch("i64", value), Ok),
            SqlValue::Text(text) => text.trim().parse().or_else(|_| mismatch("i64", value)),
            _ => mismatch("i64", value),
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        let wide = i64::from_sql_value(value)?;
        Self::try_from(wide).or_else(|_| mismatch("i32", value))
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(0.0),
            SqlValue::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(n) => Ok(*n as Self),
            SqlValue::Decimal(d) => d.to_f64().map_or_else(|| mismatch("f64", value), Ok),
            SqlValue::Text(text) => text.trim().parse().or_else(|_| mismatch("f64", value)),
            _ => mismatch("f64", value),
        }
    }
}

impl FromSqlValue for Decimal {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(Self::ZERO),
            SqlValue::Decimal(d) => Ok(*d),
            SqlValue::Int(n) => Ok(Self::from(*n)),
            SqlValue::Float(f) => Self::try_from(*f).or_else(|_| mismatch("Decimal", value)),
            SqlValue::Text(text) => Self::from_str(text.trim()).or_else(|_| mismatch("Decimal", value)),
            _ => mismatch("Decimal", value),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(Self::new()),
            SqlValue::Text(text) => Ok(text.clone()),
            SqlValue::Bool(b) => Ok(b.to_string()),
            SqlValue::Int(n) => Ok(n.to_string()),
            SqlValue::Float(f) => Ok(f.to_string()),
            SqlValue::Decimal(d) => Ok(d.to_string()),
            SqlValue::Timestamp(ts) => Ok(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            SqlValue::Blob(bytes) => Self::from_utf8(bytes.clone()).or_else(|_| mismatch("String", value)),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(Self::new()),
            SqlValue::Blob(bytes) => Ok(bytes.clone()),
            SqlValue::Text(text) => Ok(text.as_bytes().to_vec()),
            _ => mismatch("Vec<u8>", value),
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(Self::default()),
            SqlValue::Timestamp(ts) => Ok(*ts),
            SqlValue::Text(text) => parse_timestamp(text).map_or_else(|| mismatch("NaiveDateTime", value), Ok),
            SqlValue::Int(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| dt.naive_utc())
                .map_or_else(|| mismatch("NaiveDateTime", value), Ok),
            _ => mismatch("NaiveDateTime", value),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }
}

macro_rules! sql_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl SqlType for $ty {
                const KIND: ValueKind = ValueKind::$kind;
            }
        )*
    };
}

sql_type! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    f64 => Float,
    Decimal => Decimal,
    String => Text,
    Vec<u8> => Blob,
    NaiveDateTime => Timestamp,
}

impl<T: SqlType> SqlType for Option<T> {
    const KIND: ValueKind = T::KIND;
}
