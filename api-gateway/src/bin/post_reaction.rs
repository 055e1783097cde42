//! Post Reaction Lambda - records one user interaction with a Pokemon.

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

const INTERACTION_TYPES: [&str; 3] = ["like", "dislike", "favorite"];

/// Create reaction request
#[derive(Debug, Deserialize)]
struct CreateReactionRequest {
    #[serde(rename = "Fk_id_user")]
    fk_id_user: i64,
    #[serde(rename = "Fk_id_pokemon")]
    fk_id_pokemon: i64,
    interaction_type: String,
}

fn validate(request: &CreateReactionRequest) -> shared::Result<()> {
    if !INTERACTION_TYPES.contains(&request.interaction_type.as_str()) {
        return Err(shared::Error::Validation(format!(
            "Invalid interaction_type {}",
            request.interaction_type
        )));
    }
    Ok(())
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let request: CreateReactionRequest = match serde_json::from_slice(event.body().as_ref()) {
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

    let result = sqlx::query(
        r#"
        INSERT INTO Interactions (Fk_id_user, Fk_id_pokemon, interaction_type)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(request.fk_id_user)
    .bind(request.fk_id_pokemon)
    .bind(&request.interaction_type)
    .execute(&mut conn)
    .await;
    let _ = conn.close().await;

    match result {
        Ok(_) => {
            info!(
                "Recorded {} from user {} on pokemon {}",
                request.interaction_type, request.fk_id_user, request.fk_id_pokemon
            );
            message_response(200, "Reaction added successfully")
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

    fn request(interaction_type: &str) -> CreateReactionRequest {
        CreateReactionRequest {
            fk_id_user: 1,
            fk_id_pokemon: 2,
            interaction_type: interaction_type.to_string(),
        }
    }

    #[test]
    fn test_known_interaction_types_pass() {
        for kind in INTERACTION_TYPES {
            assert!(validate(&request(kind)).is_ok(), "{} must be valid", kind);
        }
    }

    #[test]
    fn test_unknown_interaction_type_is_a_400() {
        let err = validate(&request("superlike")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("superlike"));
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let err = serde_json::from_value::<CreateReactionRequest>(serde_json::json!({
            "Fk_id_user": 1,
            "interaction_type": "like"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Fk_id_pokemon"));
    }
}
