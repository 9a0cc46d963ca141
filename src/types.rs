//! Type OIDs of the builtin Postgres types the decoders understand.

use sqlx::postgres::{PgTypeInfo, PgTypeKind};
use sqlx::TypeInfo;

pub const BOOL: u32 = 16;
pub const BYTEA: u32 = 17;
pub const CHAR: u32 = 18;
pub const NAME: u32 = 19;
pub const INT8: u32 = 20;
pub const INT2: u32 = 21;
pub const INT4: u32 = 23;
pub const TEXT: u32 = 25;
pub const JSON: u32 = 114;
pub const FLOAT4: u32 = 700;
pub const FLOAT8: u32 = 701;
pub const UNKNOWN: u32 = 705;
pub const BPCHAR: u32 = 1042;
pub const VARCHAR: u32 = 1043;
pub const DATE: u32 = 1082;
pub const TIME: u32 = 1083;
pub const TIMESTAMP: u32 = 1114;
pub const TIMESTAMPTZ: u32 = 1184;
pub const NUMERIC: u32 = 1700;
pub const RECORD: u32 = 2249;
pub const UUID: u32 = 2950;
pub const JSONB: u32 = 3802;

pub const JSON_ARRAY: u32 = 199;
pub const BOOL_ARRAY: u32 = 1000;
pub const BYTEA_ARRAY: u32 = 1001;
pub const CHAR_ARRAY: u32 = 1002;
pub const NAME_ARRAY: u32 = 1003;
pub const INT2_ARRAY: u32 = 1005;
pub const INT4_ARRAY: u32 = 1007;
pub const TEXT_ARRAY: u32 = 1009;
pub const BPCHAR_ARRAY: u32 = 1014;
pub const VARCHAR_ARRAY: u32 = 1015;
pub const INT8_ARRAY: u32 = 1016;
pub const FLOAT4_ARRAY: u32 = 1021;
pub const FLOAT8_ARRAY: u32 = 1022;
pub const TIMESTAMP_ARRAY: u32 = 1115;
pub const DATE_ARRAY: u32 = 1182;
pub const TIME_ARRAY: u32 = 1183;
pub const TIMESTAMPTZ_ARRAY: u32 = 1185;
pub const NUMERIC_ARRAY: u32 = 1231;
pub const RECORD_ARRAY: u32 = 2287;
pub const UUID_ARRAY: u32 = 2951;
pub const JSONB_ARRAY: u32 = 3807;

/// Element type of a builtin array type, if `oid` names one.
pub fn array_element(oid: u32) -> Option<u32> {
    let element = match oid {
        JSON_ARRAY => JSON,
        BOOL_ARRAY => BOOL,
        BYTEA_ARRAY => BYTEA,
        CHAR_ARRAY => CHAR,
        NAME_ARRAY => NAME,
        INT2_ARRAY => INT2,
        INT4_ARRAY => INT4,
        TEXT_ARRAY => TEXT,
        BPCHAR_ARRAY => BPCHAR,
        VARCHAR_ARRAY => VARCHAR,
        INT8_ARRAY => INT8,
        FLOAT4_ARRAY => FLOAT4,
        FLOAT8_ARRAY => FLOAT8,
        TIMESTAMP_ARRAY => TIMESTAMP,
        DATE_ARRAY => DATE,
        TIME_ARRAY => TIME,
        TIMESTAMPTZ_ARRAY => TIMESTAMPTZ,
        NUMERIC_ARRAY => NUMERIC,
        RECORD_ARRAY => RECORD,
        UUID_ARRAY => UUID,
        JSONB_ARRAY => JSONB,
        _ => return None,
    };
    Some(element)
}

/// The builtin array type whose elements are `oid`.
pub fn array_of(oid: u32) -> Option<u32> {
    let array = match oid {
        JSON => JSON_ARRAY,
        BOOL => BOOL_ARRAY,
        BYTEA => BYTEA_ARRAY,
        CHAR => CHAR_ARRAY,
        NAME => NAME_ARRAY,
        INT2 => INT2_ARRAY,
        INT4 => INT4_ARRAY,
        TEXT => TEXT_ARRAY,
        BPCHAR => BPCHAR_ARRAY,
        VARCHAR => VARCHAR_ARRAY,
        INT8 => INT8_ARRAY,
        FLOAT4 => FLOAT4_ARRAY,
        FLOAT8 => FLOAT8_ARRAY,
        TIMESTAMP => TIMESTAMP_ARRAY,
        DATE => DATE_ARRAY,
        TIME => TIME_ARRAY,
        TIMESTAMPTZ => TIMESTAMPTZ_ARRAY,
        NUMERIC => NUMERIC_ARRAY,
        RECORD => RECORD_ARRAY,
        UUID => UUID_ARRAY,
        JSONB => JSONB_ARRAY,
        _ => return None,
    };
    Some(array)
}

/// Human readable name used in decode errors.
pub fn name_of(oid: u32) -> String {
    let name = match oid {
        BOOL => "BOOL",
        BYTEA => "BYTEA",
        CHAR => "\"CHAR\"",
        NAME => "NAME",
        INT8 => "INT8",
        INT2 => "INT2",
        INT4 => "INT4",
        TEXT => "TEXT",
        JSON => "JSON",
        FLOAT4 => "FLOAT4",
        FLOAT8 => "FLOAT8",
        UNKNOWN => "UNKNOWN",
        BPCHAR => "BPCHAR",
        VARCHAR => "VARCHAR",
        DATE => "DATE",
        TIME => "TIME",
        TIMESTAMP => "TIMESTAMP",
        TIMESTAMPTZ => "TIMESTAMPTZ",
        NUMERIC => "NUMERIC",
        RECORD => "RECORD",
        UUID => "UUID",
        JSONB => "JSONB",
        other => match array_element(other) {
            Some(element) => return format!("{}[]", name_of(element)),
            None => return format!("OID {other}"),
        },
    };
    name.to_owned()
}

/// Whether the decoders know `oid` without asking sqlx about it.
pub fn is_builtin(oid: u32) -> bool {
    matches!(
        oid,
        BOOL | BYTEA
            | CHAR
            | NAME
            | INT8
            | INT2
            | INT4
            | TEXT
            | JSON
            | FLOAT4
            | FLOAT8
            | UNKNOWN
            | BPCHAR
            | VARCHAR
            | DATE
            | TIME
            | TIMESTAMP
            | TIMESTAMPTZ
            | NUMERIC
            | RECORD
            | UUID
            | JSONB
    ) || array_element(oid).is_some()
}

/// sqlx only knows a type by its OID when it arrived in a simple query
/// before anything looked it up, and then names it `?`. Such a type has no
/// kind, and asking for one panics.
fn is_unresolved(type_info: &PgTypeInfo) -> bool {
    type_info.oid().is_none() || type_info.name() == "?"
}

/// Maps a column's type onto the builtin type whose wire format it shares.
///
/// Composites decode like anonymous records, enums like text and domains
/// like their base type. Anything else keeps its own OID and ends up in
/// the `Unknown` fallback if the decoders don't know it. User-defined types
/// sqlx never resolved map to `UNKNOWN`, which both decoders read as text.
pub fn resolve(type_info: &PgTypeInfo) -> Option<u32> {
    let oid = type_info.oid().map(|oid| oid.0);
    if let Some(oid) = oid.filter(|oid| is_builtin(*oid)) {
        return Some(oid);
    }
    if is_unresolved(type_info) {
        log::debug!("Type OID {oid:?} was never resolved, reading it as text");
        return Some(UNKNOWN);
    }

    match type_info.kind() {
        PgTypeKind::Composite(_) => Some(RECORD),
        PgTypeKind::Enum(_) => Some(TEXT),
        PgTypeKind::Domain(base) => resolve(base),
        PgTypeKind::Array(element) => match type_info.oid().map(|oid| oid.0) {
            Some(oid) if array_element(oid).is_some() => Some(oid),
            oid => resolve(element).and_then(array_of).or(oid),
        },
        _ => type_info.oid().map(|oid| oid.0),
    }
}
