use pg_decode_check::{ConnectionConfig, DecodedRow, ExecMode, Runner};
use sqlx::{postgres::PgConnection, Connection, Executor};

/// Integration tests need a live server; without `DATABASE_URL` they pass
/// without doing anything.
macro_rules! require_db {
    () => {
        if std::env::var_os("DATABASE_URL").is_none() {
            eprintln!("DATABASE_URL is not set, skipping");
            return Default::default();
        }
    };
}

#[allow(unused)]
pub fn config() -> ConnectionConfig {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    ConnectionConfig::from_url(url)
}

#[allow(unused)]
pub async fn runner() -> Runner {
    Runner::connect(&config()).await.unwrap()
}

#[allow(unused)]
pub async fn fetch_row(query: &str, mode: ExecMode) -> anyhow::Result<DecodedRow> {
    let mut runner = runner().await;
    let row = runner.fetch_row(query, mode).await?;
    runner.close().await?;
    Ok(row)
}

async fn conn() -> PgConnection {
    let options = config().connect_options().unwrap();
    PgConnection::connect_with(&options).await.unwrap()
}

#[allow(unused)]
pub async fn fetch_all<T: for<'de> serde::Deserialize<'de>>(
    query: &str,
    mode: ExecMode,
) -> anyhow::Result<Vec<T>> {
    let mut conn = conn().await;

    let rows = match mode {
        ExecMode::Binary => sqlx::query(query).fetch_all(&mut conn).await?,
        ExecMode::Text => (&mut conn).fetch_all(query).await?,
    };
    let result: Result<Vec<_>, _> = rows.into_iter().map(pg_decode_check::from_pg_row).collect();

    result.map_err(Into::into)
}

#[allow(unused)]
pub async fn fetch_one<T: for<'de> serde::Deserialize<'de>>(
    query: &str,
    mode: ExecMode,
) -> anyhow::Result<T> {
    let mut rows = fetch_all(query, mode).await?;
    anyhow::ensure!(rows.len() == 1, "expected one row, got {}", rows.len());
    Ok(rows.remove(0))
}
