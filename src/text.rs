//! Decoders for the text result format.
//!
//! Arrays and records arrive as literals, `{a,NULL,"b c"}` and `(a,,"b c")`.
//! Array literals carry their element type through the column type; record
//! literals carry no field types at all, so their fields stay `Text`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::json::PgJson;
use crate::numeric::PgNumeric;
use crate::types::{self, name_of};
use crate::value::PgValue;

fn parse<T>(oid: u32, s: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    s.parse()
        .map_err(|e| Error::decode(name_of(oid), format!("`{s}`: {e}")))
}

/// Decodes one non-null text value of type `oid`.
pub fn decode(oid: u32, s: &str) -> Result<PgValue> {
    let value = match oid {
        types::BOOL => match s {
            "t" | "true" => PgValue::Bool(true),
            "f" | "false" => PgValue::Bool(false),
            _ => return Err(Error::decode("BOOL", format!("`{s}` is not a boolean"))),
        },
        types::INT2 => PgValue::Int2(parse(oid, s)?),
        types::INT4 => PgValue::Int4(parse(oid, s)?),
        types::INT8 => PgValue::Int8(parse(oid, s)?),
        // Rust's float parser already accepts NaN, Infinity and -Infinity in
        // any case.
        types::FLOAT4 => PgValue::Float4(parse(oid, s)?),
        types::FLOAT8 => PgValue::Float8(parse(oid, s)?),
        types::NUMERIC => PgValue::Numeric(PgNumeric::decode_text(s)?),
        types::BYTEA => PgValue::Bytea(decode_bytea(s)?),
        types::JSON | types::JSONB => PgValue::Json(PgJson::from_text(s)?.0),
        types::UUID => PgValue::Uuid(parse::<Uuid>(oid, s)?),
        types::DATE => PgValue::Date(
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::decode("DATE", e))?,
        ),
        types::TIME => PgValue::Time(
            NaiveTime::parse_from_str(s, "%H:%M:%S%.f").map_err(|e| Error::decode("TIME", e))?,
        ),
        types::TIMESTAMP => PgValue::Timestamp(
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map_err(|e| Error::decode("TIMESTAMP", e))?,
        ),
        types::TIMESTAMPTZ => PgValue::Timestamptz(
            DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z")
                .map_err(|e| Error::decode("TIMESTAMPTZ", e))?
                .with_timezone(&Utc),
        ),
        types::RECORD => decode_record(s)?,
        other => match types::array_element(other) {
            Some(element) => decode_array(element, s)?,
            // Text, the string types and whatever we don't know stay as-is.
            None => PgValue::Text(s.to_owned()),
        },
    };

    Ok(value)
}

/// `bytea` in the default `hex` output format: `\x` followed by hex pairs.
fn decode_bytea(s: &str) -> Result<Vec<u8>> {
    let hex = s
        .strip_prefix("\\x")
        .ok_or_else(|| Error::decode("BYTEA", "only the hex output format is supported"))?;
    if hex.len() % 2 != 0 {
        return Err(Error::decode("BYTEA", "odd number of hex digits"));
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| Error::decode("BYTEA", format!("invalid hex at offset {i}")))
        })
        .collect()
}

/// Decodes an array literal, e.g. `{1,2,3}`, `{foo,NULL,bar}`,
/// `{{1,2},{3,4}}` or `[0:1]={1,2}`.
pub fn decode_array(element: u32, s: &str) -> Result<PgValue> {
    // Arrays with non-default lower bounds are prefixed with their bounds.
    let body = match s.strip_prefix('[') {
        Some(_) => s
            .split_once('=')
            .map(|(_, body)| body)
            .ok_or_else(|| Error::decode("ARRAY", format!("`{s}`: malformed bounds")))?,
        None => s,
    };

    let mut chars = body.chars().peekable();
    let array = parse_array(element, &mut chars)?;
    if chars.next().is_some() {
        return Err(Error::decode("ARRAY", format!("`{s}`: trailing characters")));
    }
    Ok(array)
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn parse_array(element: u32, chars: &mut Chars<'_>) -> Result<PgValue> {
    if chars.next() != Some('{') {
        return Err(Error::decode("ARRAY", "expected `{`"));
    }

    let mut items = Vec::new();
    if chars.peek() == Some(&'}') {
        chars.next();
        return Ok(PgValue::Array(items));
    }

    loop {
        let item = match chars.peek() {
            Some('{') => parse_array(element, chars)?,
            Some('"') => {
                let quoted = parse_quoted(chars, "ARRAY")?;
                decode(element, &quoted)?
            }
            Some(_) => {
                let mut raw = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ',' || c == '}' {
                        break;
                    }
                    chars.next();
                    if c == '\\' {
                        raw.extend(chars.next());
                    } else {
                        raw.push(c);
                    }
                }
                let raw = raw.trim();
                if raw.eq_ignore_ascii_case("NULL") {
                    PgValue::Null
                } else {
                    decode(element, raw)?
                }
            }
            None => return Err(Error::decode("ARRAY", "unterminated array")),
        };
        items.push(item);

        match chars.next() {
            Some(',') => continue,
            Some('}') => return Ok(PgValue::Array(items)),
            Some(c) => return Err(Error::decode("ARRAY", format!("unexpected `{c}`"))),
            None => return Err(Error::decode("ARRAY", "unterminated array")),
        }
    }
}

/// Reads a double-quoted item. Backslash escapes the next character, and in
/// records a doubled quote stands for one quote.
fn parse_quoted(chars: &mut Chars<'_>, type_name: &str) -> Result<String> {
    chars.next();
    let mut out = String::new();
    loop {
        match chars.next() {
            Some('\\') => match chars.next() {
                Some(c) => out.push(c),
                None => break,
            },
            Some('"') if chars.peek() == Some(&'"') => {
                chars.next();
                out.push('"');
            }
            Some('"') => return Ok(out),
            Some(c) => out.push(c),
            None => break,
        }
    }
    Err(Error::decode(type_name, "unterminated quoted value"))
}

/// Decodes a record literal such as `(123 Main St,New York,10001)`. An empty
/// unquoted field is NULL while `""` is the empty string.
pub fn decode_record(s: &str) -> Result<PgValue> {
    let mut chars = s.chars().peekable();
    if chars.next() != Some('(') {
        return Err(Error::decode("RECORD", format!("`{s}`: expected `(`")));
    }

    let mut fields = Vec::new();
    if chars.peek() == Some(&')') {
        chars.next();
    } else {
        loop {
            let mut field = String::new();
            let mut quoted = false;
            while let Some(&c) = chars.peek() {
                match c {
                    ',' | ')' => break,
                    '"' => {
                        quoted = true;
                        field.push_str(&parse_quoted(&mut chars, "RECORD")?);
                    }
                    '\\' => {
                        chars.next();
                        field.extend(chars.next());
                    }
                    _ => {
                        chars.next();
                        field.push(c);
                    }
                }
            }

            fields.push(if field.is_empty() && !quoted {
                PgValue::Null
            } else {
                PgValue::Text(field)
            });

            match chars.next() {
                Some(',') => continue,
                Some(')') => break,
                _ => return Err(Error::decode("RECORD", format!("`{s}`: unterminated record"))),
            }
        }
    }

    if chars.next().is_some() {
        return Err(Error::decode("RECORD", format!("`{s}`: trailing characters")));
    }
    Ok(PgValue::Record(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> PgValue {
        PgValue::Text(s.to_owned())
    }

    #[test]
    fn special_floats() {
        assert_eq!(decode(types::FLOAT4, "Infinity").unwrap(), PgValue::Float4(f32::INFINITY));
        assert_eq!(
            decode(types::FLOAT8, "-Infinity").unwrap(),
            PgValue::Float8(f64::NEG_INFINITY)
        );
        let PgValue::Float8(nan) = decode(types::FLOAT8, "NaN").unwrap() else {
            panic!("expected FLOAT8");
        };
        assert!(nan.is_nan());
        assert!(matches!(
            decode(types::NUMERIC, "Infinity").unwrap(),
            PgValue::Numeric(PgNumeric::Infinity)
        ));
    }

    #[test]
    fn scalars() {
        assert_eq!(decode(types::BOOL, "t").unwrap(), PgValue::Bool(true));
        assert_eq!(decode(types::INT8, "-42").unwrap(), PgValue::Int8(-42));
        assert_eq!(decode(types::BYTEA, "\\xdeadbeef").unwrap(), PgValue::Bytea(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(
            decode(types::TIMESTAMPTZ, "2024-03-01 12:30:00.5+02").unwrap(),
            PgValue::Timestamptz(
                DateTime::parse_from_rfc3339("2024-03-01T10:30:00.5Z")
                    .unwrap()
                    .with_timezone(&Utc)
            )
        );
        assert!(decode(types::INT4, "4.5").is_err());
        assert!(decode(types::BOOL, "yes").is_err());
    }

    #[test]
    fn arrays() {
        assert_eq!(
            decode(types::INT8_ARRAY, "{1,2,3}").unwrap(),
            PgValue::Array(vec![PgValue::Int8(1), PgValue::Int8(2), PgValue::Int8(3)])
        );
        assert_eq!(
            decode(types::TEXT_ARRAY, "{foo,NULL,bar}").unwrap(),
            PgValue::Array(vec![text("foo"), PgValue::Null, text("bar")])
        );
        assert_eq!(
            decode(types::TEXT_ARRAY, r#"{"NULL","",null,"a \"b\"",c\,d}"#).unwrap(),
            PgValue::Array(vec![
                text("NULL"),
                text(""),
                PgValue::Null,
                text("a \"b\""),
                text("c,d"),
            ])
        );
        assert_eq!(
            decode(types::INT4_ARRAY, "[0:1]={{1,2},{3,4}}").unwrap(),
            PgValue::Array(vec![
                PgValue::Array(vec![PgValue::Int4(1), PgValue::Int4(2)]),
                PgValue::Array(vec![PgValue::Int4(3), PgValue::Int4(4)]),
            ])
        );
        assert_eq!(decode(types::INT4_ARRAY, "{}").unwrap(), PgValue::Array(vec![]));
        assert!(decode(types::INT4_ARRAY, "{1,2").is_err());
        assert!(decode(types::INT4_ARRAY, "{1,2}x").is_err());
    }

    #[test]
    fn records() {
        assert_eq!(
            decode(types::RECORD, "(\"123 Main St\",\"New York\",10001)").unwrap(),
            PgValue::Record(vec![text("123 Main St"), text("New York"), text("10001")])
        );
        assert_eq!(
            decode(types::RECORD, "(a,,\"\",\"say \"\"hi\"\"\")").unwrap(),
            PgValue::Record(vec![text("a"), PgValue::Null, text(""), text("say \"hi\"")])
        );
        assert!(decode(types::RECORD, "(a,b").is_err());
    }

    #[test]
    fn array_of_records() {
        assert_eq!(
            decode(
                types::RECORD_ARRAY,
                r#"{"(\"123 Main St\",\"New York\",10001)","(\"234 Main St\",,10002)"}"#
            )
            .unwrap(),
            PgValue::Array(vec![
                PgValue::Record(vec![text("123 Main St"), text("New York"), text("10001")]),
                PgValue::Record(vec![text("234 Main St"), PgValue::Null, text("10002")]),
            ])
        );
    }
}
