//! Delete Reaction Lambda - removes one interaction by primary key.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use sqlx::Connection;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared::db::{connect, map_db_error};
use shared::http::{failure_response, message_response};
use shared::secrets::{resolve_secret, DatabaseSecret};
use shared::Config;

/// Delete reaction request
#[derive(Debug, Deserialize)]
struct DeleteReactionRequest {
    id_interaction: i64,
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let request: DeleteReactionRequest = match serde_json::from_slice(event.body().as_ref()) {
        Ok(parsed) => parsed,
        Err(e) => return message_response(400, e.to_string()),
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

    let result = sqlx::query("DELETE FROM Interactions WHERE id_interaction = ?")
        .bind(request.id_interaction)
        .execute(&mut conn)
        .await;
    let _ = conn.close().await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            message_response(404, "Interaction not found")
        }
        Ok(_) => {
            info!("Deleted interaction {}", request.id_interaction);
            message_response(200, "Interaction deleted successfully")
        }
        Err(e) => failure_response(&map_db_error(e)),
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

    #[test]
    fn test_missing_id_interaction_names_the_field() {
        let err =
            serde_json::from_value::<DeleteReactionRequest>(serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("id_interaction"));
    }
}
