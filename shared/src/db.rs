//! MySQL connection management and store error mapping.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Row, TypeInfo};

use crate::secrets::DatabaseSecret;
use crate::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Open one connection for this invocation, with a short connect timeout.
///
/// The connection must be closed on every exit path; handlers run their
/// statements through a helper and close before shaping the response.
pub async fn connect(secret: &DatabaseSecret, database: &str) -> Result<MySqlConnection> {
    let options = MySqlConnectOptions::new()
        .host(&secret.host)
        .username(&secret.username)
        .password(&secret.password)
        .database(database);

    tokio::time::timeout(CONNECT_TIMEOUT, options.connect())
        .await
        .map_err(|_| Error::Unavailable(format!("Timed out connecting to {}", database)))?
        .map_err(map_db_error)
}

/// Map a store failure onto the status code the handlers return.
///
/// Classification is by SQLSTATE where the server produced one; transport
/// failures count as unavailability, everything unrecognized is a 500.
pub fn map_db_error(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::Io(e) => Error::Unavailable(e.to_string()),
        sqlx::Error::Tls(e) => Error::Unavailable(e.to_string()),
        sqlx::Error::PoolTimedOut => Error::Unavailable("Connection timed out".to_string()),
        sqlx::Error::Database(e) => match e.code().as_deref() {
            Some("28000") => Error::Auth(e.to_string()),
            Some("42000") | Some("42S02") => Error::NotFound(e.to_string()),
            Some("23000") => Error::Integrity(e.to_string()),
            _ => Error::Internal(e.to_string()),
        },
        other => Error::Internal(other.to_string()),
    }
}

/// Wire column families, keyed off the MySQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Signed,
    Unsigned,
    Float,
    Bool,
    Json,
    Date,
    Time,
    DateTime,
    Timestamp,
    Text,
}

fn column_kind(type_name: &str) -> ColumnKind {
    match type_name {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => ColumnKind::Signed,
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => ColumnKind::Unsigned,
        "FLOAT" | "DOUBLE" => ColumnKind::Float,
        "BOOLEAN" => ColumnKind::Bool,
        "JSON" => ColumnKind::Json,
        "DATE" => ColumnKind::Date,
        "TIME" => ColumnKind::Time,
        "DATETIME" => ColumnKind::DateTime,
        "TIMESTAMP" => ColumnKind::Timestamp,
        _ => ColumnKind::Text,
    }
}

/// One decoded column value, detached from the wire row.
#[derive(Debug, Clone)]
enum ColumnValue {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
    Json(serde_json::Value),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Text(String),
    Null,
}

/// Render a decoded value as JSON. Integers stay numeric, temporal values
/// are stringified, JSON passes through. Rendering is a pure function of
/// the decoded value: the byte-for-byte idempotence of repeated reads
/// rests on this.
fn column_value_to_json(value: ColumnValue) -> serde_json::Value {
    match value {
        ColumnValue::Signed(n) => serde_json::Value::from(n),
        ColumnValue::Unsigned(n) => serde_json::Value::from(n),
        ColumnValue::Float(f) => serde_json::Value::from(f),
        ColumnValue::Bool(b) => serde_json::Value::from(b),
        ColumnValue::Json(v) => v,
        ColumnValue::Date(d) => serde_json::Value::String(d.to_string()),
        ColumnValue::Time(t) => serde_json::Value::String(t.to_string()),
        ColumnValue::DateTime(dt) => serde_json::Value::String(dt.to_string()),
        ColumnValue::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
        ColumnValue::Text(s) => serde_json::Value::String(s),
        ColumnValue::Null => serde_json::Value::Null,
    }
}

fn decode_column(row: &MySqlRow, index: usize, kind: ColumnKind) -> ColumnValue {
    let value = match kind {
        ColumnKind::Signed => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::Signed),
        ColumnKind::Unsigned => row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::Unsigned),
        ColumnKind::Float => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::Float),
        ColumnKind::Bool => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::Bool),
        ColumnKind::Json => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::Json),
        ColumnKind::Date => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::Date),
        ColumnKind::Time => row
            .try_get::<Option<NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::Time),
        ColumnKind::DateTime => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::DateTime),
        ColumnKind::Timestamp => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::Timestamp),
        ColumnKind::Text => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(ColumnValue::Text),
    };

    value.unwrap_or(ColumnValue::Null)
}

/// Decode a dynamically-typed row into a column name -> value mapping.
///
/// Anything undecodable becomes null rather than failing the read.
pub fn row_to_json(row: &MySqlRow) -> serde_json::Value {
    let mut object = serde_json::Map::new();

    for (index, column) in row.columns().iter().enumerate() {
        let kind = column_kind(column.type_info().name());
        let value = decode_column(row, index, kind);
        object.insert(column.name().to_string(), column_value_to_json(value));
    }

    serde_json::Value::Object(object)
}
