#[macro_use]
mod util;

use pg_decode_check::{ExecMode, PgValue};
use pretty_assertions::assert_eq;
use serde_json::Value as JsValue;
use util::{fetch_all, fetch_one, fetch_row};

#[tokio::test]
async fn bigint_array_in_both_modes() {
    require_db!();

    let expected = PgValue::Array(vec![PgValue::Int8(1), PgValue::Int8(2), PgValue::Int8(3)]);
    for mode in [ExecMode::Binary, ExecMode::Text] {
        let row = fetch_row("select Array[1::bigint, 2::bigint, 3::bigint]", mode)
            .await
            .unwrap();
        assert_eq!(row.values, vec![expected.clone()], "{mode}");
    }
}

#[tokio::test]
async fn text_array_keeps_null_apart_from_the_string() {
    require_db!();

    let row = fetch_row("select Array['foo', null, 'bar', 'null', '']", ExecMode::Binary)
        .await
        .unwrap();
    assert_eq!(
        row.values,
        vec![PgValue::Array(vec![
            "foo".into(),
            PgValue::Null,
            "bar".into(),
            "null".into(),
            "".into(),
        ])]
    );

    let text = fetch_row("select Array['foo', null, 'bar', 'null', '']", ExecMode::Text)
        .await
        .unwrap();
    assert_eq!(text.values, row.values);
}

#[tokio::test]
async fn bigint_array_as_vec_i64() {
    require_db!();

    let row: Vec<i64> = fetch_one(
        "select Array[1::bigint, 2::bigint, 3::bigint]",
        ExecMode::Binary,
    )
    .await
    .unwrap();
    assert_eq!(row, vec![1, 2, 3]);
}

#[tokio::test]
async fn pg_arr_of_text_as_vec_nullable_string() {
    require_db!();

    for mode in [ExecMode::Binary, ExecMode::Text] {
        let rows: Vec<Vec<Option<String>>> = fetch_all(
            "SELECT array_agg(R.a) _0 FROM (SELECT 'a string'::VARCHAR a UNION ALL SELECT NULL) R",
            mode,
        )
        .await
        .unwrap();
        assert_eq!(rows, vec![vec![Some("a string".to_owned()), None]]);
    }
}

#[tokio::test]
async fn pg_arr_of_bool_as_vec_bool() {
    require_db!();

    let rows: Vec<Vec<bool>> = fetch_all(
        "SELECT array_agg(R.a) _0 FROM (SELECT true a UNION ALL SELECT false) R",
        ExecMode::Binary,
    )
    .await
    .unwrap();
    assert_eq!(rows, vec![vec![true, false]]);
}

#[tokio::test]
async fn two_dimensional_array() {
    require_db!();

    let rows: Vec<Vec<Vec<i32>>> =
        fetch_all("select Array[[1, 2], [3, 4]]", ExecMode::Binary)
            .await
            .unwrap();
    assert_eq!(rows, vec![vec![vec![1, 2], vec![3, 4]]]);
}

#[tokio::test]
async fn pg_arr_of_jsonb_as_vec_of_jsvalue() {
    require_db!();

    let rows: Vec<Vec<JsValue>> = fetch_all(
        "SELECT array_agg(R.a) _0 FROM (SELECT '1'::JSONB a UNION ALL SELECT '2'::JSONB) R",
        ExecMode::Binary,
    )
    .await
    .unwrap();
    assert_eq!(rows, vec![vec![serde_json::json!(1), serde_json::json!(2)]]);
}
