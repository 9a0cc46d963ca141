//! Decoders for the binary result format.

use bytes::Buf;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::json::PgJson;
use crate::numeric::PgNumeric;
use crate::types::{self, name_of};
use crate::value::PgValue;

/// Postgres refuses arrays with more dimensions than this.
const MAX_ARRAY_DIMS: usize = 6;

fn ensure(buf: &&[u8], len: usize, type_name: &str) -> Result<()> {
    if buf.remaining() < len {
        return Err(Error::decode(
            type_name,
            format!("needed {len} more bytes, {} left", buf.remaining()),
        ));
    }
    Ok(())
}

pub(crate) fn read_i16(buf: &mut &[u8], type_name: &str) -> Result<i16> {
    ensure(buf, 2, type_name)?;
    Ok(buf.get_i16())
}

pub(crate) fn read_u16(buf: &mut &[u8], type_name: &str) -> Result<u16> {
    ensure(buf, 2, type_name)?;
    Ok(buf.get_u16())
}

pub(crate) fn read_i32(buf: &mut &[u8], type_name: &str) -> Result<i32> {
    ensure(buf, 4, type_name)?;
    Ok(buf.get_i32())
}

pub(crate) fn read_u32(buf: &mut &[u8], type_name: &str) -> Result<u32> {
    ensure(buf, 4, type_name)?;
    Ok(buf.get_u32())
}

/// Reads an `i32` length prefix and the value it frames; `-1` is NULL.
fn read_framed<'a>(buf: &mut &'a [u8], type_name: &str) -> Result<Option<&'a [u8]>> {
    let len = read_i32(buf, type_name)?;
    if len == -1 {
        return Ok(None);
    }
    let len = usize::try_from(len)
        .map_err(|_| Error::decode(type_name, format!("invalid value length {len}")))?;
    ensure(buf, len, type_name)?;
    let slice: &'a [u8] = *buf;
    let (value, rest) = slice.split_at(len);
    *buf = rest;
    Ok(Some(value))
}

fn exact<const N: usize>(buf: &[u8], oid: u32) -> Result<[u8; N]> {
    buf.try_into().map_err(|_| {
        Error::decode(
            name_of(oid),
            format!("expected {N} bytes, got {}", buf.len()),
        )
    })
}

fn utf8(buf: &[u8], oid: u32) -> Result<String> {
    String::from_utf8(buf.to_vec()).map_err(|e| Error::decode(name_of(oid), e))
}

fn pg_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::default())
}

/// Decodes one non-null binary value of type `oid`.
pub fn decode(oid: u32, buf: &[u8]) -> Result<PgValue> {
    let value = match oid {
        types::BOOL => PgValue::Bool(exact::<1>(buf, oid)?[0] != 0),
        types::INT2 => PgValue::Int2(i16::from_be_bytes(exact(buf, oid)?)),
        types::INT4 => PgValue::Int4(i32::from_be_bytes(exact(buf, oid)?)),
        types::INT8 => PgValue::Int8(i64::from_be_bytes(exact(buf, oid)?)),
        types::FLOAT4 => PgValue::Float4(f32::from_be_bytes(exact(buf, oid)?)),
        types::FLOAT8 => PgValue::Float8(f64::from_be_bytes(exact(buf, oid)?)),
        types::NUMERIC => PgValue::Numeric(PgNumeric::decode_binary(buf)?),
        types::TEXT
        | types::VARCHAR
        | types::BPCHAR
        | types::NAME
        | types::CHAR
        | types::UNKNOWN => PgValue::Text(utf8(buf, oid)?),
        types::BYTEA => PgValue::Bytea(buf.to_vec()),
        types::JSON | types::JSONB => PgValue::Json(PgJson::from_binary(oid, buf)?.0),
        types::UUID => PgValue::Uuid(Uuid::from_bytes(exact(buf, oid)?)),
        types::DATE => {
            let days = i32::from_be_bytes(exact(buf, oid)?);
            let date = TimeDelta::try_days(i64::from(days))
                .and_then(|delta| pg_epoch().date().checked_add_signed(delta))
                .ok_or_else(|| Error::decode("DATE", format!("{days} days is out of range")))?;
            PgValue::Date(date)
        }
        types::TIME => {
            let micros = i64::from_be_bytes(exact(buf, oid)?);
            let time = u32::try_from(micros.div_euclid(1_000_000))
                .ok()
                .and_then(|secs| {
                    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
                    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                })
                .ok_or_else(|| Error::decode("TIME", format!("{micros}us is out of range")))?;
            PgValue::Time(time)
        }
        types::TIMESTAMP | types::TIMESTAMPTZ => {
            let micros = i64::from_be_bytes(exact(buf, oid)?);
            let timestamp = pg_epoch()
                .checked_add_signed(TimeDelta::microseconds(micros))
                .ok_or_else(|| Error::decode(name_of(oid), format!("{micros}us is out of range")))?;
            if oid == types::TIMESTAMP {
                PgValue::Timestamp(timestamp)
            } else {
                PgValue::Timestamptz(DateTime::<Utc>::from_naive_utc_and_offset(timestamp, Utc))
            }
        }
        types::RECORD => decode_record(buf)?,
        other => match types::array_element(other) {
            Some(element) => decode_array(Some(element), buf)?,
            None => {
                log::warn!("No binary decoder for {}, keeping raw bytes", name_of(other));
                PgValue::Unknown {
                    oid: other,
                    data: buf.to_vec(),
                }
            }
        },
    };

    Ok(value)
}

fn decode_nullable(oid: u32, value: Option<&[u8]>) -> Result<PgValue> {
    match value {
        Some(buf) => decode(oid, buf),
        None => Ok(PgValue::Null),
    }
}

/// Decodes an array: `ndim`, a has-null flag and the element OID, then a
/// (length, lower bound) pair per dimension, then every element in row-major
/// order with its own length prefix.
///
/// `element` overrides the OID in the header, which for arrays of custom types
/// names a type the decoders can't know about.
pub fn decode_array(element: Option<u32>, mut buf: &[u8]) -> Result<PgValue> {
    let ndim = read_i32(&mut buf, "ARRAY")?;
    let _has_null = read_i32(&mut buf, "ARRAY")?;
    let header_element = read_u32(&mut buf, "ARRAY")?;
    let element = element.unwrap_or(header_element);

    if ndim == 0 {
        return Ok(PgValue::Array(Vec::new()));
    }
    let ndim = usize::try_from(ndim)
        .ok()
        .filter(|ndim| *ndim <= MAX_ARRAY_DIMS)
        .ok_or_else(|| Error::decode("ARRAY", format!("invalid dimension count {ndim}")))?;

    let mut dims = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        let len = read_i32(&mut buf, "ARRAY")?;
        let _lower_bound = read_i32(&mut buf, "ARRAY")?;
        let len = usize::try_from(len)
            .map_err(|_| Error::decode("ARRAY", format!("invalid dimension length {len}")))?;
        dims.push(len);
    }

    // Every element carries at least its length prefix.
    let fits = dims
        .iter()
        .try_fold(1usize, |total, len| total.checked_mul(*len))
        .is_some_and(|total| total.saturating_mul(4) <= buf.remaining());
    if !fits {
        return Err(Error::decode(
            "ARRAY",
            format!("dimensions {dims:?} exceed the {} bytes left", buf.remaining()),
        ));
    }

    let array = decode_dimension(element, &dims, &mut buf)?;
    if buf.has_remaining() {
        return Err(Error::decode(
            "ARRAY",
            format!("{} trailing bytes", buf.remaining()),
        ));
    }
    Ok(array)
}

fn decode_dimension(element: u32, dims: &[usize], buf: &mut &[u8]) -> Result<PgValue> {
    let Some((&len, inner)) = dims.split_first() else {
        return decode_nullable(element, read_framed(buf, "ARRAY")?);
    };

    let items = (0..len)
        .map(|_| decode_dimension(element, inner, buf))
        .collect::<Result<Vec<_>>>()?;
    Ok(PgValue::Array(items))
}

/// Decodes a record: the field count, then per field its OID and a length
/// prefixed value.
pub fn decode_record(mut buf: &[u8]) -> Result<PgValue> {
    let count = read_i32(&mut buf, "RECORD")?;
    // Every field carries at least its OID and length prefix.
    let count = usize::try_from(count)
        .ok()
        .filter(|count| count.saturating_mul(8) <= buf.remaining())
        .ok_or_else(|| {
            Error::decode(
                "RECORD",
                format!("field count {count} exceeds the {} bytes left", buf.remaining()),
            )
        })?;

    let mut fields = Vec::with_capacity(count);
    for _ in 0..count {
        let oid = read_u32(&mut buf, "RECORD")?;
        fields.push(decode_nullable(oid, read_framed(&mut buf, "RECORD")?)?);
    }

    if buf.has_remaining() {
        return Err(Error::decode(
            "RECORD",
            format!("{} trailing bytes", buf.remaining()),
        ));
    }
    Ok(PgValue::Record(fields))
}
