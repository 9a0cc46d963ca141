//! The fixed list of checks, in the order they run.
//!
//! Arrays and records are fetched in binary, the infinities in text, so both
//! decoding paths see the special numeric values.

use crate::check::{Case, ExecMode, Expect};
use crate::error::{Error, Result};
use crate::value::PgValue;

fn text(s: &str) -> PgValue {
    PgValue::Text(s.to_owned())
}

fn address(street: &str, city: Option<&str>, zip: i32) -> PgValue {
    PgValue::Record(vec![text(street), city.into(), PgValue::Int4(zip)])
}

pub fn extended_mode_cases() -> Vec<Case> {
    vec![
        Case {
            name: "bigint_array",
            sql: "select Array[1::bigint, 2::bigint, 3::bigint]",
            mode: ExecMode::Binary,
            expect: vec![Expect::Equals(PgValue::Array(vec![
                PgValue::Int8(1),
                PgValue::Int8(2),
                PgValue::Int8(3),
            ]))],
        },
        Case {
            name: "text_array_with_null",
            sql: "select Array['foo', null, 'bar']",
            mode: ExecMode::Binary,
            expect: vec![Expect::Equals(PgValue::Array(vec![
                text("foo"),
                PgValue::Null,
                text("bar"),
            ]))],
        },
        Case {
            name: "row_literal",
            sql: "select ROW('123 Main St'::varchar, 'New York'::varchar, 10001)",
            mode: ExecMode::Binary,
            expect: vec![Expect::Equals(address("123 Main St", Some("New York"), 10001))],
        },
        Case {
            name: "array_of_rows",
            sql: "select array[ROW('123 Main St'::varchar, 'New York'::varchar, 10001), \
                  ROW('234 Main St'::varchar, null, 10002)]",
            mode: ExecMode::Binary,
            expect: vec![Expect::Equals(PgValue::Array(vec![
                address("123 Main St", Some("New York"), 10001),
                address("234 Main St", None, 10002),
            ]))],
        },
        Case {
            name: "nan",
            sql: "select 'NaN'::numeric, 'NaN'::real, 'NaN'::double precision",
            mode: ExecMode::Binary,
            expect: vec![Expect::NaN; 3],
        },
        Case {
            name: "infinity",
            sql: "select 'Infinity'::numeric, 'Infinity'::real, 'Infinity'::double precision",
            mode: ExecMode::Text,
            expect: vec![Expect::PositiveInfinity; 3],
        },
        Case {
            name: "negative_infinity",
            sql: "select '-Infinity'::numeric, '-Infinity'::real, '-Infinity'::double precision",
            mode: ExecMode::Text,
            expect: vec![Expect::NegativeInfinity; 3],
        },
    ]
}

/// Keeps the named cases, in their usual order. Every name must exist.
pub fn select(cases: Vec<Case>, names: &[String]) -> Result<Vec<Case>> {
    if names.is_empty() {
        return Ok(cases);
    }

    if let Some(unknown) = names
        .iter()
        .find(|name| !cases.iter().any(|case| case.name == name.as_str()))
    {
        return Err(Error::Config(format!("unknown case `{unknown}`")));
    }

    Ok(cases
        .into_iter()
        .filter(|case| names.iter().any(|name| name == case.name))
        .collect())
}
