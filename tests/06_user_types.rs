#[macro_use]
mod util;

use pg_decode_check::{check_agreement, ExecMode, PgValue, Runner};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use sqlx::{postgres::PgConnection, Connection, Executor};

/// Opens a connection with an open transaction holding the given types, so
/// nothing outlives the test.
async fn conn_with_types(prefix: &str) -> PgConnection {
    let options = util::config().connect_options().unwrap();
    let mut conn = PgConnection::connect_with(&options).await.unwrap();
    conn.execute(
        format!(
            "BEGIN;
             CREATE TYPE {prefix}_mood AS ENUM ('happy', 'sad');
             CREATE TYPE {prefix}_address AS (street varchar, zip int4);
             CREATE DOMAIN {prefix}_zip AS int4 CHECK (VALUE > 0);"
        )
        .as_str(),
    )
    .await
    .unwrap();
    conn
}

fn select(prefix: &str) -> String {
    format!(
        "select 'sad'::{prefix}_mood, ROW('1 Main St', 10001)::{prefix}_address, \
         10001::{prefix}_zip, ARRAY['happy', 'sad']::{prefix}_mood[]"
    )
}

#[tokio::test]
async fn text_mode_before_the_types_are_known() {
    require_db!();

    let mut runner = Runner::new(conn_with_types("decode_text_first").await);
    let sql = select("decode_text_first");

    // Nothing has looked the types up yet, so they arrive as plain literals.
    let text = runner.fetch_row(&sql, ExecMode::Text).await.unwrap();
    assert_eq!(
        text.values,
        vec![
            "sad".into(),
            r#"("1 Main St",10001)"#.into(),
            PgValue::Int4(10001),
            "{happy,sad}".into(),
        ]
    );

    let binary = runner.fetch_row(&sql, ExecMode::Binary).await.unwrap();
    assert_eq!(
        binary.values,
        vec![
            "sad".into(),
            PgValue::Record(vec!["1 Main St".into(), PgValue::Int4(10001)]),
            PgValue::Int4(10001),
            PgValue::Array(vec!["happy".into(), "sad".into()]),
        ]
    );

    // Binary mode made sqlx resolve them, text mode now sees their kinds.
    let text = runner.fetch_row(&sql, ExecMode::Text).await.unwrap();
    assert_eq!(
        text.values[1],
        PgValue::Record(vec!["1 Main St".into(), "10001".into()])
    );
    check_agreement("user_types", &binary, &text).unwrap();

    runner.close().await.unwrap();
}

#[tokio::test]
async fn user_types_into_structs() {
    require_db!();

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Mood {
        Happy,
        Sad,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Address {
        street: String,
        zip: i32,
    }

    let mut conn = conn_with_types("decode_structs").await;
    let sql = select("decode_structs");

    let row = (&mut conn).fetch_one(sql.as_str()).await.unwrap();
    let (mood, _, zip, moods): (Mood, String, i32, String) =
        pg_decode_check::from_pg_row(row).unwrap();
    assert_eq!((mood, zip, moods.as_str()), (Mood::Sad, 10001, "{happy,sad}"));

    let row = sqlx::query(&sql).fetch_one(&mut conn).await.unwrap();
    let (mood, address, zip, moods): (Mood, Address, i32, Vec<Mood>) =
        pg_decode_check::from_pg_row(row).unwrap();
    assert_eq!(mood, Mood::Sad);
    assert_eq!(
        address,
        Address {
            street: "1 Main St".to_owned(),
            zip: 10001,
        }
    );
    assert_eq!(zip, 10001);
    assert_eq!(moods, vec![Mood::Happy, Mood::Sad]);
}
