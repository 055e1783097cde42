//! Post Badge Lambda - inserts one badge and returns the collection.

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

/// Create badge request
#[derive(Debug, Deserialize)]
struct CreateBadgeRequest {
    badge_name: String,
    description: serde_json::Value,
    standard_to_get: String,
    date_earned: String,
    image: String,
}

async fn insert_and_fetch(
    conn: &mut MySqlConnection,
    request: &CreateBadgeRequest,
) -> shared::Result<Vec<serde_json::Value>> {
    sqlx::query(
        r#"
        INSERT INTO Badges (
            badge_name, description, standard_to_get, date_earned, image
        ) VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&request.badge_name)
    .bind(&request.description)
    .bind(&request.standard_to_get)
    .bind(&request.date_earned)
    .bind(&request.image)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;

    let rows = sqlx::query("SELECT * FROM Badges")
        .fetch_all(&mut *conn)
        .await
        .map_err(map_db_error)?;

    Ok(rows.iter().map(row_to_json).collect())
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let request: CreateBadgeRequest = match serde_json::from_slice(event.body().as_ref()) {
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

    let outcome = insert_and_fetch(&mut conn, &request).await;
    let _ = conn.close().await;

    match outcome {
        Ok(badges) => {
            info!("Created badge {}", request.badge_name);
            json_response(200, &badges)
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

    #[test]
    fn test_missing_field_names_the_field() {
        let err = serde_json::from_value::<CreateBadgeRequest>(serde_json::json!({
            "badge_name": "Boulder Badge"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing field"));
        assert!(err.to_string().contains("description"));
    }
}
