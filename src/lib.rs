//! Decodes Postgres rows, binary or text, into [`PgValue`]s or any serde
//! type, and checks that a server and sqlx agree on arrays, records and the
//! special numeric values.

mod binary;
pub mod cases;
pub mod check;
pub mod config;
mod de;
pub mod error;
mod json;
mod map_access;
pub mod numeric;
mod row;
mod seq_access;
mod text;
pub mod types;
mod value;

use serde::de::{value::Error as DeError, Deserialize, Error as _};
use sqlx::postgres::PgRow;

pub use check::{check_agreement, Case, ExecMode, Expect, RunSummary, Runner};
pub use config::ConnectionConfig;
pub use de::{PgRowDeserializer, PgValueDeserializer};
pub use error::{Error, Result};
pub use numeric::PgNumeric;
pub use row::DecodedRow;
pub use value::PgValue;

/// Convenience function: deserialize a PgRow into any T that implements Deserialize
pub fn from_pg_row<T>(row: PgRow) -> Result<T, DeError>
where
    T: for<'de> Deserialize<'de>,
{
    let decoded = DecodedRow::decode(&row).map_err(DeError::custom)?;
    from_decoded_row(&decoded)
}

pub fn from_decoded_row<T>(row: &DecodedRow) -> Result<T, DeError>
where
    T: for<'de> Deserialize<'de>,
{
    T::deserialize(PgRowDeserializer::new(row))
}
