//! Post Publication Lambda - inserts one Pokemon and returns the collection.
//!
//! Input is validated before any external call: a parse failure or a
//! negative count never opens a connection.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared::db::{connect, map_db_error, row_to_json};
use shared::http::{failure_response, json_response, message_response};
use shared::secrets::{resolve_secret, DatabaseSecret};
use shared::Config;

/// Create pokemon request
#[derive(Debug, Deserialize)]
struct CreatePokemonRequest {
    pokemon_name: String,
    abilities: serde_json::Value,
    types: serde_json::Value,
    description: String,
    evolution_conditions: String,
    image: String,
    likes_count: i64,
    dislikes_count: i64,
    creation_update_date: String,
    id_pokemon: i64,
    fk_id_user_creator: i64,
}

fn validate(request: &CreatePokemonRequest) -> shared::Result<()> {
    if request.likes_count < 0 {
        return Err(shared::Error::Range(
            "likes_count must be non-negative".to_string(),
        ));
    }
    if request.dislikes_count < 0 {
        return Err(shared::Error::Range(
            "dislikes_count must be non-negative".to_string(),
        ));
    }
    Ok(())
}

async fn insert_and_fetch(
    conn: &mut MySqlConnection,
    request: &CreatePokemonRequest,
) -> shared::Result<Vec<serde_json::Value>> {
    sqlx::query(
        r#"
        INSERT INTO Pokemon (
            pokemon_name, abilities, types, description,
            evolution_conditions, image, likes_count,
            dislikes_count, creation_update_date, id_pokemon, fk_id_user_creator
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&request.pokemon_name)
    .bind(&request.abilities)
    .bind(&request.types)
    .bind(&request.description)
    .bind(&request.evolution_conditions)
    .bind(&request.image)
    .bind(request.likes_count)
    .bind(request.dislikes_count)
    .bind(&request.creation_update_date)
    .bind(request.id_pokemon)
    .bind(request.fk_id_user_creator)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;

    let rows = sqlx::query("SELECT * FROM Pokemon")
        .fetch_all(&mut *conn)
        .await
        .map_err(map_db_error)?;

    Ok(rows.iter().map(row_to_json).collect())
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let request: CreatePokemonRequest = match serde_json::from_slice(event.body().as_ref()) {
        Ok(parsed) => parsed,
        Err(e) => return message_response(400, e.to_string()),
    };

    if let Err(e) = validate(&request) {
        return failure_response(&e);
    }

    let secret: DatabaseSecret =
        match resolve_secret(&state.secrets, &state.config.db_secret_name).await {
            Ok(secret) => secret,
            Err(e) => return failure_response(&e),
        };

    let mut conn = match connect(&secret, &state.config.db_name).await {
        Ok(conn) => conn,
        Err(e) => return failure_response(&e),
    };

    let outcome = insert_and_fetch(&mut conn, &request).await;
    let _ = conn.close().await;

    match outcome {
        Ok(pokemon) => {
            info!("Created pokemon {}", request.id_pokemon);
            json_response(200, &pokemon)
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

    fn sample() -> CreatePokemonRequest {
        serde_json::from_value(serde_json::json!({
            "pokemon_name": "Sionpomon",
            "abilities": ["overgrow"],
            "types": ["grass"],
            "description": "A test creature",
            "evolution_conditions": "level 16",
            "image": "https://example.com/p.png",
            "likes_count": 0,
            "dislikes_count": 0,
            "creation_update_date": "2024-05-01 10:00:00",
            "id_pokemon": 1,
            "fk_id_user_creator": 7
        }))
        .unwrap()
    }

    #[test]
    fn test_not_json_body_fails_to_parse() {
        let err = serde_json::from_slice::<CreatePokemonRequest>(b"not json").unwrap_err();
        assert!(err.to_string().contains("line 1 column"));
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let err = serde_json::from_value::<CreatePokemonRequest>(serde_json::json!({
            "pokemon_name": "Sionpomon"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_negative_counts_are_rejected_with_422() {
        let mut request = sample();
        request.likes_count = -1;
        let err = validate(&request).unwrap_err();
        assert_eq!(err.status_code(), 422);

        let mut request = sample();
        request.dislikes_count = -3;
        let err = validate(&request).unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_valid_request_passes_validation() {
        assert!(validate(&sample()).is_ok());
    }
}
