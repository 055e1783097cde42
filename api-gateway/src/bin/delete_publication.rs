//! Delete Publication Lambda - removes one Pokemon by primary key.
//!
//! A delete that affects zero rows is a 404; absence is an error here,
//! unlike the read-one endpoint which returns an empty body.

use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use sqlx::Connection;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared::db::{connect, map_db_error};
use shared::http::{failure_response, message_response};
use shared::secrets::{resolve_secret, DatabaseSecret};
use shared::Config;

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

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let params = event.query_string_parameters();
    let id_pokemon: i64 = match params.first("id_pokemon").and_then(|v| v.parse().ok()) {
        Some(id) => id,
        None => return message_response(400, "Missing or invalid id_pokemon"),
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

    let result = sqlx::query("DELETE FROM Pokemon WHERE id_pokemon = ?")
        .bind(id_pokemon)
        .execute(&mut conn)
        .await;
    let _ = conn.close().await;

    match result {
        Ok(done) if done.rows_affected() == 0 => message_response(404, "Pokemon not found"),
        Ok(_) => {
            info!("Deleted pokemon {}", id_pokemon);
            message_response(200, "Pokemon deleted successfully")
        }
        Err(e) => failure_response(&map_db_error(e)),
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
