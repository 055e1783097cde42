//! Get Publications Lambda - lists every Pokemon row.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use shared::db::{connect, map_db_error, row_to_json};
use shared::http::{failure_response, json_response};
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

async fn fetch_all_pokemon(
    conn: &mut MySqlConnection,
) -> shared::Result<Vec<serde_json::Value>> {
    let rows = sqlx::query("SELECT * FROM Pokemon")
        .fetch_all(&mut *conn)
        .await
        .map_err(map_db_error)?;

    Ok(rows.iter().map(row_to_json).collect())
}

async fn handler(state: Arc<AppState>, _event: Request) -> Result<Response<Body>, Error> {
    let secret: DatabaseSecret =
        match resolve_secret(&state.secrets, &state.config.db_secret_name).await {
            Ok(secret) => secret,
            Err(e) => return failure_response(&e),
        };

    let mut conn = match connect(&secret, &state.config.db_name).await {
        Ok(conn) => conn,
        Err(e) => return failure_response(&e),
    };

    let outcome = fetch_all_pokemon(&mut conn).await;
    let _ = conn.close().await;

    match outcome {
        Ok(pokemon) => json_response(200, &pokemon),
        Err(e) => failure_response(&e),
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
