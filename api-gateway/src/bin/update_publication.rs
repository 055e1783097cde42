//! Update Publication Lambda - dynamic partial update of one Pokemon.
//!
//! The SET clause is built from the fields present in `updated_data`;
//! column names are checked against a whitelist so the dynamic SQL can
//! never carry attacker-controlled identifiers.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnection};
use sqlx::query::Query;
use sqlx::Connection;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared::db::{connect, map_db_error};
use shared::http::{failure_response, message_response};
use shared::secrets::{resolve_secret, DatabaseSecret};
use shared::Config;

const UPDATABLE_COLUMNS: [&str; 10] = [
    "pokemon_name",
    "abilities",
    "types",
    "description",
    "evolution_conditions",
    "image",
    "likes_count",
    "dislikes_count",
    "creation_update_date",
    "fk_id_user_creator",
];

/// Update pokemon request
#[derive(Debug, Deserialize)]
struct UpdatePokemonRequest {
    id_pokemon: i64,
    #[serde(default)]
    updated_data: serde_json::Map<String, serde_json::Value>,
}

/// Build `UPDATE Pokemon SET col = ?, … WHERE id_pokemon = ?` from the
/// fields present in the request. Zero fields is an input error.
fn build_update_query(
    fields: &serde_json::Map<String, serde_json::Value>,
) -> shared::Result<String> {
    if fields.is_empty() {
        return Err(shared::Error::Validation(
            "updated_data must contain at least one field".to_string(),
        ));
    }

    let mut assignments = Vec::with_capacity(fields.len());
    for key in fields.keys() {
        if !UPDATABLE_COLUMNS.contains(&key.as_str()) {
            return Err(shared::Error::Validation(format!(
                "Unknown column {} in updated_data",
                key
            )));
        }
        assignments.push(format!("{} = ?", key));
    }

    Ok(format!(
        "UPDATE Pokemon SET {} WHERE id_pokemon = ?",
        assignments.join(", ")
    ))
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q serde_json::Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        serde_json::Value::Null => query.bind(None::<String>),
        serde_json::Value::Bool(b) => query.bind(*b),
        serde_json::Value::Number(n) if n.is_i64() => query.bind(n.as_i64().unwrap_or_default()),
        serde_json::Value::Number(n) if n.is_u64() => query.bind(n.as_u64().unwrap_or_default()),
        serde_json::Value::Number(n) => query.bind(n.as_f64().unwrap_or_default()),
        serde_json::Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.clone()),
    }
}

async fn update_pokemon(
    conn: &mut MySqlConnection,
    request: &UpdatePokemonRequest,
    sql: &str,
) -> shared::Result<u64> {
    let mut query = sqlx::query(sql);
    for value in request.updated_data.values() {
        query = bind_value(query, value);
    }
    query = query.bind(request.id_pokemon);

    let done = query.execute(&mut *conn).await.map_err(map_db_error)?;
    Ok(done.rows_affected())
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let request: UpdatePokemonRequest = match serde_json::from_slice(event.body().as_ref()) {
        Ok(parsed) => parsed,
        Err(e) => return message_response(400, e.to_string()),
    };

    let sql = match build_update_query(&request.updated_data) {
        Ok(sql) => sql,
        Err(e) => return failure_response(&e),
    };

    let secret: DatabaseSecret =
        match resolve_secret(&state.secrets, &state.config.db_secret_name).await {
            Ok(secret) => secret,
            Err(e) => return failure_response(&e),
        };

    let mut conn = match connect(&secret, &state.config.db_name).await {
        Ok(conn) => conn,
        Err(e) => return failure_response(&e),
    };

    let outcome = update_pokemon(&mut conn, &request, &sql).await;
    let _ = conn.close().await;

    match outcome {
        Ok(rows) => {
            info!("Updated pokemon {} ({} rows)", request.id_pokemon, rows);
            message_response(200, "Pokemon updated successfully")
        }
        Err(e) => failure_response(&e),
    }
}

/// Application state
struct AppState {
    secrets: aws_sdk_secretsmanager::Client,
    config: Config,
}

impl AppState {
    async fn new() -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            secrets: aws_sdk_secretsmanager::Client::new(&aws_config),
            config: Config::from_env(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(json: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match json {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_set_clause_built_from_present_fields() {
        let sql = build_update_query(&fields(serde_json::json!({
            "pokemon_name": "Sionpomon",
            "likes_count": 3
        })))
        .unwrap();
        assert!(sql.starts_with("UPDATE Pokemon SET "));
        assert!(sql.ends_with(" WHERE id_pokemon = ?"));
        assert!(sql.contains("pokemon_name = ?"));
        assert!(sql.contains("likes_count = ?"));
        assert!(!sql.contains("description"));
    }

    #[test]
    fn test_empty_updated_data_is_an_input_error() {
        let err = build_update_query(&serde_json::Map::new()).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let err = build_update_query(&fields(serde_json::json!({
            "id_pokemon; DROP TABLE Pokemon": 1
        })))
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("Unknown column"));
    }

    #[test]
    fn test_request_parses_without_updated_data() {
        let request: UpdatePokemonRequest =
            serde_json::from_value(serde_json::json!({"id_pokemon": 5})).unwrap();
        assert_eq!(request.id_pokemon, 5);
        assert!(request.updated_data.is_empty());
    }
}
