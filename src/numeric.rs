use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bytes::Buf;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgTypeInfo, PgValueFormat, PgValueRef, Postgres};

use crate::binary::{read_i16, read_u16};
use crate::error::{Error, Result};
use crate::types;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

const NBASE: i128 = 10_000;

/// A Postgres `numeric`, which unlike `rust_decimal::Decimal` can also hold
/// `NaN`, `Infinity` and `-Infinity`.
///
/// `NaN` compares unequal to everything, itself included, the same way
/// `f64::NAN` does.
#[derive(Debug, Clone, Copy)]
pub enum PgNumeric {
    Finite(Decimal),
    NaN,
    Infinity,
    NegativeInfinity,
}

impl PgNumeric {
    pub fn is_nan(&self) -> bool {
        matches!(self, PgNumeric::NaN)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, PgNumeric::Infinity | PgNumeric::NegativeInfinity)
    }

    /// Lossy conversion; the special values map onto their `f64` counterparts.
    pub fn to_f64(&self) -> f64 {
        match self {
            PgNumeric::Finite(decimal) => decimal
                .to_f64()
                .unwrap_or_else(|| decimal.to_string().parse().unwrap_or(f64::NAN)),
            PgNumeric::NaN => f64::NAN,
            PgNumeric::Infinity => f64::INFINITY,
            PgNumeric::NegativeInfinity => f64::NEG_INFINITY,
        }
    }

    /// Decodes the binary wire format: a header of `ndigits`, `weight`,
    /// `sign` and `dscale` followed by `ndigits` base-10000 digits, the first
    /// of which is worth `10000^weight`.
    pub fn decode_binary(mut buf: &[u8]) -> Result<Self> {
        let ndigits = read_i16(&mut buf, "NUMERIC")?;
        let weight = read_i16(&mut buf, "NUMERIC")?;
        let sign = read_u16(&mut buf, "NUMERIC")?;
        let dscale = read_u16(&mut buf, "NUMERIC")?;

        match sign {
            NUMERIC_NAN => return Ok(PgNumeric::NaN),
            NUMERIC_PINF => return Ok(PgNumeric::Infinity),
            NUMERIC_NINF => return Ok(PgNumeric::NegativeInfinity),
            NUMERIC_POS | NUMERIC_NEG => {}
            other => return Err(Error::decode("NUMERIC", format!("invalid sign {other:#06x}"))),
        }
        if ndigits < 0 {
            return Err(Error::decode("NUMERIC", format!("negative digit count {ndigits}")));
        }
        if buf.remaining() != ndigits as usize * 2 {
            return Err(Error::decode(
                "NUMERIC",
                format!("{ndigits} digits declared, {} bytes left", buf.remaining()),
            ));
        }

        let overflow = || Error::decode("NUMERIC", "value does not fit in a Decimal");

        let mut mantissa: i128 = 0;
        for _ in 0..ndigits {
            let digit = buf.get_i16();
            if !(0..10_000).contains(&digit) {
                return Err(Error::decode("NUMERIC", format!("invalid digit {digit}")));
            }
            mantissa = mantissa
                .checked_mul(NBASE)
                .and_then(|m| m.checked_add(i128::from(digit)))
                .ok_or_else(overflow)?;
        }

        let exponent = i32::from(weight) - i32::from(ndigits) + 1;
        let (mantissa, scale) = if exponent >= 0 {
            let factor = NBASE.checked_pow(exponent as u32).ok_or_else(overflow)?;
            (mantissa.checked_mul(factor).ok_or_else(overflow)?, 0)
        } else {
            (mantissa, exponent.unsigned_abs() * 4)
        };

        let mut decimal = Decimal::try_from_i128_with_scale(mantissa, scale).map_err(|_| overflow())?;
        decimal.rescale(u32::from(dscale));
        if sign == NUMERIC_NEG {
            decimal.set_sign_negative(true);
        }

        Ok(PgNumeric::Finite(decimal))
    }

    pub fn decode_text(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl FromStr for PgNumeric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("nan") {
            Ok(PgNumeric::NaN)
        } else if trimmed.eq_ignore_ascii_case("infinity") || trimmed.eq_ignore_ascii_case("+infinity") {
            Ok(PgNumeric::Infinity)
        } else if trimmed.eq_ignore_ascii_case("-infinity") {
            Ok(PgNumeric::NegativeInfinity)
        } else {
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .map(PgNumeric::Finite)
                .map_err(|e| Error::decode("NUMERIC", format!("`{s}`: {e}")))
        }
    }
}

impl fmt::Display for PgNumeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgNumeric::Finite(decimal) => decimal.fmt(f),
            PgNumeric::NaN => f.write_str("NaN"),
            PgNumeric::Infinity => f.write_str("Infinity"),
            PgNumeric::NegativeInfinity => f.write_str("-Infinity"),
        }
    }
}

impl PartialEq for PgNumeric {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for PgNumeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use PgNumeric::*;

        match (self, other) {
            (NaN, _) | (_, NaN) => None,
            (Finite(a), Finite(b)) => Some(a.cmp(b)),
            (Infinity, Infinity) | (NegativeInfinity, NegativeInfinity) => Some(Ordering::Equal),
            (NegativeInfinity, _) | (_, Infinity) => Some(Ordering::Less),
            (Infinity, _) | (_, NegativeInfinity) => Some(Ordering::Greater),
        }
    }
}

impl From<Decimal> for PgNumeric {
    fn from(decimal: Decimal) -> Self {
        PgNumeric::Finite(decimal)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for PgNumeric {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let numeric = match value.format() {
            PgValueFormat::Binary => PgNumeric::decode_binary(value.as_bytes()?)?,
            PgValueFormat::Text => PgNumeric::decode_text(value.as_str()?)?,
        };
        Ok(numeric)
    }
}

impl sqlx::Type<Postgres> for PgNumeric {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(types::NUMERIC))
    }
}

impl<'de> Deserialize<'de> for PgNumeric {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PgNumericVisitor;

        impl<'de> Visitor<'de> for PgNumericVisitor {
            type Value = PgNumeric;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a numeric value, NaN or an infinity")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PgNumeric, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<PgNumeric, E> {
                if v.is_nan() {
                    Ok(PgNumeric::NaN)
                } else if v == f64::INFINITY {
                    Ok(PgNumeric::Infinity)
                } else if v == f64::NEG_INFINITY {
                    Ok(PgNumeric::NegativeInfinity)
                } else {
                    Decimal::try_from(v).map(PgNumeric::Finite).map_err(E::custom)
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PgNumeric, E> {
                Ok(PgNumeric::Finite(Decimal::from(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PgNumeric, E> {
                Ok(PgNumeric::Finite(Decimal::from(v)))
            }
        }

        deserializer.deserialize_str(PgNumericVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encode(ndigits: i16, weight: i16, sign: u16, dscale: u16, digits: &[i16]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&ndigits.to_be_bytes());
        buf.extend_from_slice(&weight.to_be_bytes());
        buf.extend_from_slice(&sign.to_be_bytes());
        buf.extend_from_slice(&dscale.to_be_bytes());
        for digit in digits {
            buf.extend_from_slice(&digit.to_be_bytes());
        }
        buf
    }

    fn dec(s: &str) -> PgNumeric {
        PgNumeric::Finite(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn binary_special_values() {
        assert!(PgNumeric::decode_binary(&encode(0, 0, NUMERIC_NAN, 0, &[])).unwrap().is_nan());
        assert!(matches!(
            PgNumeric::decode_binary(&encode(0, 0, NUMERIC_PINF, 0, &[])).unwrap(),
            PgNumeric::Infinity
        ));
        assert!(matches!(
            PgNumeric::decode_binary(&encode(0, 0, NUMERIC_NINF, 0, &[])).unwrap(),
            PgNumeric::NegativeInfinity
        ));
    }

    #[test]
    fn binary_finite_values() {
        // 10001 = 1 * 10000^1 + 1 * 10000^0
        let value = PgNumeric::decode_binary(&encode(2, 1, NUMERIC_POS, 0, &[1, 1])).unwrap();
        assert_eq!(value.to_string(), "10001");

        // -123.45 = 123 * 10000^0 + 4500 * 10000^-1
        let value = PgNumeric::decode_binary(&encode(2, 0, NUMERIC_NEG, 2, &[123, 4500])).unwrap();
        assert_eq!(value.to_string(), "-123.45");

        // 0.0001
        let value = PgNumeric::decode_binary(&encode(1, -1, NUMERIC_POS, 4, &[1])).unwrap();
        assert_eq!(value.to_string(), "0.0001");

        // 20000000 = 2000 * 10000^1, trailing zero group dropped
        let value = PgNumeric::decode_binary(&encode(1, 1, NUMERIC_POS, 0, &[2000])).unwrap();
        assert_eq!(value.to_string(), "20000000");

        let zero = PgNumeric::decode_binary(&encode(0, 0, NUMERIC_POS, 1, &[])).unwrap();
        assert_eq!(zero.to_string(), "0.0");
    }

    #[test]
    fn binary_rejects_garbage() {
        assert!(PgNumeric::decode_binary(&[0, 1]).is_err());
        assert!(PgNumeric::decode_binary(&encode(0, 0, 0x1234, 0, &[])).is_err());
        assert!(PgNumeric::decode_binary(&encode(1, 0, NUMERIC_POS, 0, &[10_000])).is_err());
        assert!(PgNumeric::decode_binary(&encode(2, 0, NUMERIC_POS, 0, &[1])).is_err());
        assert!(PgNumeric::decode_binary(&encode(1, 40, NUMERIC_POS, 0, &[1])).is_err());
    }

    #[test]
    fn text_values() {
        assert!(PgNumeric::decode_text("NaN").unwrap().is_nan());
        assert!(matches!(PgNumeric::decode_text("Infinity").unwrap(), PgNumeric::Infinity));
        assert!(matches!(
            PgNumeric::decode_text("-Infinity").unwrap(),
            PgNumeric::NegativeInfinity
        ));
        assert_eq!(PgNumeric::decode_text("10001").unwrap(), dec("10001"));
        assert_eq!(PgNumeric::decode_text("-0.50").unwrap(), dec("-0.5"));
        assert!(PgNumeric::decode_text("twelve").is_err());
    }

    #[test]
    fn nan_equals_nothing() {
        let nan = PgNumeric::NaN;
        assert_ne!(nan, nan);
        assert_ne!(nan, dec("0"));
        assert_ne!(nan, PgNumeric::Infinity);
        assert_eq!(nan.partial_cmp(&nan), None);
    }

    #[test]
    fn infinities_bound_finite_values() {
        let finite = [dec("-100000000000000000000"), dec("0"), dec("123.45")];
        for value in finite {
            assert!(PgNumeric::NegativeInfinity < value);
            assert!(value < PgNumeric::Infinity);
        }
        assert!(PgNumeric::NegativeInfinity < PgNumeric::Infinity);
        assert_eq!(PgNumeric::Infinity, PgNumeric::Infinity);
    }

    #[test]
    fn to_f64_keeps_specials() {
        assert!(PgNumeric::NaN.to_f64().is_nan());
        assert_eq!(PgNumeric::Infinity.to_f64(), f64::INFINITY);
        assert_eq!(PgNumeric::NegativeInfinity.to_f64(), f64::NEG_INFINITY);
        assert_eq!(dec("2.5").to_f64(), 2.5);
    }

    #[test]
    fn matches_numeric_columns_by_oid() {
        use sqlx::Type;

        let numeric = <PgNumeric as Type<Postgres>>::type_info();
        assert_eq!(numeric.oid(), Some(Oid(types::NUMERIC)));
        assert!(<PgNumeric as Type<Postgres>>::compatible(&PgTypeInfo::with_oid(Oid(
            types::NUMERIC
        ))));
        assert!(!<PgNumeric as Type<Postgres>>::compatible(&PgTypeInfo::with_oid(Oid(
            types::FLOAT8
        ))));
    }
}
