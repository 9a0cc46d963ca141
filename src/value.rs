use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgTypeInfo, PgValueFormat, PgValueRef, Postgres};
use sqlx::{TypeInfo, ValueRef};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::numeric::PgNumeric;
use crate::{binary, text, types};

/// A decoded Postgres value of any type.
///
/// `Null` stands for SQL NULL wherever it appears, including inside arrays
/// and records, and is distinct from every string.
#[derive(Debug, Clone, PartialEq)]
pub enum PgValue {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Numeric(PgNumeric),
    Text(String),
    Bytea(Vec<u8>),
    Json(JsonValue),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Timestamptz(DateTime<Utc>),
    /// Multi-dimensional arrays nest one `Array` per dimension.
    Array(Vec<PgValue>),
    Record(Vec<PgValue>),
    /// A binary value of a type we have no decoder for.
    Unknown { oid: u32, data: Vec<u8> },
}

impl PgValue {
    /// Decodes a raw column value, whichever result format it arrived in.
    pub fn decode(raw: PgValueRef<'_>) -> Result<Self> {
        if raw.is_null() {
            return Ok(PgValue::Null);
        }

        let type_info = raw.type_info();
        let oid = types::resolve(&type_info).ok_or_else(|| {
            Error::decode(type_info.name(), "type has no OID, it was never resolved by the server")
        })?;

        match raw.format() {
            PgValueFormat::Binary => {
                let bytes = raw.as_bytes().map_err(|e| Error::decode(type_info.name(), e))?;
                binary::decode(oid, bytes)
            }
            PgValueFormat::Text => {
                let s = raw.as_str().map_err(|e| Error::decode(type_info.name(), e))?;
                text::decode(oid, s)
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PgValue::Null)
    }

    /// True for floating point and numeric NaN.
    pub fn is_nan(&self) -> bool {
        match self {
            PgValue::Float4(v) => v.is_nan(),
            PgValue::Float8(v) => v.is_nan(),
            PgValue::Numeric(n) => n.is_nan(),
            _ => false,
        }
    }

    /// The value as an `f64`, for the numeric variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PgValue::Int2(v) => Some(f64::from(*v)),
            PgValue::Int4(v) => Some(f64::from(*v)),
            PgValue::Int8(v) => Some(*v as f64),
            PgValue::Float4(v) => Some(f64::from(*v)),
            PgValue::Float8(v) => Some(*v),
            PgValue::Numeric(n) => Some(n.to_f64()),
            _ => None,
        }
    }

    /// The builtin type a scalar value was decoded from.
    fn scalar_type(&self) -> Option<u32> {
        let oid = match self {
            PgValue::Bool(_) => types::BOOL,
            PgValue::Int2(_) => types::INT2,
            PgValue::Int4(_) => types::INT4,
            PgValue::Int8(_) => types::INT8,
            PgValue::Float4(_) => types::FLOAT4,
            PgValue::Float8(_) => types::FLOAT8,
            PgValue::Numeric(_) => types::NUMERIC,
            PgValue::Text(_) => types::TEXT,
            PgValue::Bytea(_) => types::BYTEA,
            PgValue::Json(_) => types::JSON,
            PgValue::Uuid(_) => types::UUID,
            PgValue::Date(_) => types::DATE,
            PgValue::Time(_) => types::TIME,
            PgValue::Timestamp(_) => types::TIMESTAMP,
            PgValue::Timestamptz(_) => types::TIMESTAMPTZ,
            PgValue::Null
            | PgValue::Array(_)
            | PgValue::Record(_)
            | PgValue::Unknown { .. } => return None,
        };
        Some(oid)
    }

    /// Whether a value decoded from the binary format and one decoded from
    /// the text format describe the same thing.
    ///
    /// Beyond plain equality, NaN agrees with NaN, and an untyped `Text`
    /// field of a text-format record agrees with a typed binary value when
    /// the text parses to that value.
    pub fn agrees_with(&self, text_value: &PgValue) -> bool {
        match (self, text_value) {
            (PgValue::Array(a), PgValue::Array(b)) | (PgValue::Record(a), PgValue::Record(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.agrees_with(b))
            }
            (a, PgValue::Text(s)) if !matches!(a, PgValue::Text(_)) => a
                .scalar_type()
                .and_then(|oid| text::decode(oid, s).ok())
                .is_some_and(|parsed| a.agrees_with(&parsed)),
            (a, b) if a.is_nan() || b.is_nan() => {
                a.is_nan() && b.is_nan() && a.scalar_type() == b.scalar_type()
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for PgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, items: &[PgValue], open: &str, close: &str) -> fmt::Result {
            f.write_str(open)?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str(close)
        }

        match self {
            PgValue::Null => f.write_str("NULL"),
            PgValue::Bool(v) => write!(f, "{v}"),
            PgValue::Int2(v) => write!(f, "{v}::int2"),
            PgValue::Int4(v) => write!(f, "{v}::int4"),
            PgValue::Int8(v) => write!(f, "{v}::int8"),
            PgValue::Float4(v) => write!(f, "{v}::float4"),
            PgValue::Float8(v) => write!(f, "{v}::float8"),
            PgValue::Numeric(v) => write!(f, "{v}::numeric"),
            PgValue::Text(v) => write!(f, "{v:?}"),
            PgValue::Bytea(v) => write!(f, "{} bytes", v.len()),
            PgValue::Json(v) => write!(f, "{v}"),
            PgValue::Uuid(v) => write!(f, "{v}"),
            PgValue::Date(v) => write!(f, "{v}"),
            PgValue::Time(v) => write!(f, "{v}"),
            PgValue::Timestamp(v) => write!(f, "{v}"),
            PgValue::Timestamptz(v) => write!(f, "{}", v.to_rfc3339()),
            PgValue::Array(items) => list(f, items, "[", "]"),
            PgValue::Record(fields) => list(f, fields, "(", ")"),
            PgValue::Unknown { oid, data } => write!(f, "<{} bytes of OID {oid}>", data.len()),
        }
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for PgValue {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(PgValue::decode(value)?)
    }
}

impl sqlx::Type<Postgres> for PgValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("unknown")
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}

impl From<&str> for PgValue {
    fn from(s: &str) -> Self {
        PgValue::Text(s.to_owned())
    }
}

impl From<i32> for PgValue {
    fn from(v: i32) -> Self {
        PgValue::Int4(v)
    }
}

impl From<i64> for PgValue {
    fn from(v: i64) -> Self {
        PgValue::Int8(v)
    }
}

impl<T: Into<PgValue>> From<Option<T>> for PgValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(PgValue::Null, Into::into)
    }
}
