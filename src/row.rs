use sqlx::postgres::PgRow;
use sqlx::{Column, Row};

use crate::error::Result;
use crate::value::PgValue;

/// A row with every column decoded into a [`PgValue`], in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRow {
    pub columns: Vec<String>,
    pub values: Vec<PgValue>,
}

impl DecodedRow {
    pub fn decode(row: &PgRow) -> Result<Self> {
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());

        for column in row.columns() {
            let raw = row.try_get_raw(column.ordinal())?;
            columns.push(column.name().to_owned());
            values.push(PgValue::decode(raw)?);
        }

        Ok(DecodedRow { columns, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PgValue> {
        self.values.get(index)
    }
}
