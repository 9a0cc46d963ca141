use std::fmt;

use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Connection, Executor};

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::row::DecodedRow;
use crate::value::PgValue;

/// How a query is sent, which decides the result format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Extended query protocol, results in the binary format.
    Binary,
    /// Simple query protocol, results in the text format.
    Text,
}

impl ExecMode {
    pub fn other(self) -> Self {
        match self {
            ExecMode::Binary => ExecMode::Text,
            ExecMode::Text => ExecMode::Binary,
        }
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecMode::Binary => f.write_str("binary"),
            ExecMode::Text => f.write_str("text"),
        }
    }
}

/// What one column of the result must be.
#[derive(Debug, Clone, PartialEq)]
pub enum Expect {
    Equals(PgValue),
    NaN,
    PositiveInfinity,
    NegativeInfinity,
}

impl Expect {
    pub fn matches(&self, value: &PgValue) -> bool {
        match self {
            Expect::Equals(expected) => expected == value,
            Expect::NaN => value.is_nan(),
            Expect::PositiveInfinity => value.as_f64() == Some(f64::INFINITY),
            Expect::NegativeInfinity => value.as_f64() == Some(f64::NEG_INFINITY),
        }
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expect::Equals(value) => write!(f, "{value}"),
            Expect::NaN => f.write_str("NaN"),
            Expect::PositiveInfinity => f.write_str("Infinity"),
            Expect::NegativeInfinity => f.write_str("-Infinity"),
        }
    }
}

impl From<PgValue> for Expect {
    fn from(value: PgValue) -> Self {
        Expect::Equals(value)
    }
}

/// One query, how to send it and what its single row must look like.
#[derive(Debug, Clone)]
pub struct Case {
    pub name: &'static str,
    pub sql: &'static str,
    pub mode: ExecMode,
    pub expect: Vec<Expect>,
}

impl Case {
    /// Checks a fetched row column by column.
    pub fn verify(&self, mode: ExecMode, row: &DecodedRow) -> Result<()> {
        if row.len() != self.expect.len() {
            return Err(Error::ColumnCount {
                case: self.name.to_owned(),
                mode,
                expected: self.expect.len(),
                actual: row.len(),
            });
        }

        for (column, (expect, actual)) in self.expect.iter().zip(&row.values).enumerate() {
            if !expect.matches(actual) {
                log::error!("Check `{}` failed on column {column}", self.name);
                return Err(Error::Mismatch {
                    case: self.name.to_owned(),
                    mode,
                    column,
                    expected: expect.to_string(),
                    actual: actual.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub cross_checked: usize,
}

/// Runs cases one after the other on a single connection, stopping at the
/// first failure.
pub struct Runner {
    conn: PgConnection,
    cross_check: bool,
}

impl Runner {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = config.connect_options()?;
        log::info!("Connecting to {}", config.describe());
        let conn = PgConnection::connect_with(&options).await?;
        Ok(Runner::new(conn))
    }

    pub fn new(conn: PgConnection) -> Self {
        Runner {
            conn,
            cross_check: false,
        }
    }

    /// Also run every case in the other mode and require both decodings to
    /// agree.
    pub fn cross_check(mut self, enabled: bool) -> Self {
        self.cross_check = enabled;
        self
    }

    /// Executes `sql` and decodes its only row.
    pub async fn fetch_row(&mut self, sql: &str, mode: ExecMode) -> Result<DecodedRow> {
        let rows: Vec<PgRow> = match mode {
            // Queries built with `sqlx::query` are always prepared, and sqlx
            // asks for every result column in binary.
            ExecMode::Binary => sqlx::query(sql).fetch_all(&mut self.conn).await?,
            // A bare string has no arguments, so sqlx sends it as a simple
            // query and the server answers in text.
            ExecMode::Text => (&mut self.conn).fetch_all(sql).await?,
        };

        let [row] = rows.as_slice() else {
            return Err(Error::RowCount {
                sql: sql.to_owned(),
                count: rows.len(),
            });
        };

        let decoded = DecodedRow::decode(row)?;
        log::debug!("{mode} `{sql}` -> {:?}", decoded.values);
        Ok(decoded)
    }

    pub async fn run_case(&mut self, case: &Case) -> Result<()> {
        log::info!("Running `{}` ({})", case.name, case.mode);

        let row = self.fetch_row(case.sql, case.mode).await?;
        case.verify(case.mode, &row)?;

        if self.cross_check {
            let other_mode = case.mode.other();
            let other = self.fetch_row(case.sql, other_mode).await?;

            let (binary, text) = match case.mode {
                ExecMode::Binary => (&row, &other),
                ExecMode::Text => (&other, &row),
            };
            check_agreement(case.name, binary, text)?;
        }

        log::info!("`{}` passed", case.name);
        Ok(())
    }

    pub async fn run(&mut self, cases: &[Case]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for case in cases {
            self.run_case(case).await?;
            summary.passed += 1;
            if self.cross_check {
                summary.cross_checked += 1;
            }
        }
        Ok(summary)
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

/// Both decodings of the same row must describe the same values.
pub fn check_agreement(case: &str, binary: &DecodedRow, text: &DecodedRow) -> Result<()> {
    if binary.len() != text.len() {
        return Err(Error::Disagreement {
            case: case.to_owned(),
            column: binary.len().min(text.len()),
            binary: format!("{} columns", binary.len()),
            text: format!("{} columns", text.len()),
        });
    }

    for (column, (b, t)) in binary.values.iter().zip(&text.values).enumerate() {
        if !b.agrees_with(t) {
            return Err(Error::Disagreement {
                case: case.to_owned(),
                column,
                binary: b.to_string(),
                text: t.to_string(),
            });
        }
    }
    Ok(())
}
