//! Register Lambda - signs a new user up with the Cognito user pool.

use aws_sdk_cognitoidentityprovider::types::AttributeType;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared::cognito::{provider_error, secret_hash};
use shared::http::{error_response, json_response};
use shared::secrets::{resolve_secret, CognitoSecret};
use shared::Config;

/// Register request
#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    password: String,
    email: String,
    picture: String,
}

/// Application state
struct AppState {
    secrets: aws_sdk_secretsmanager::Client,
    cognito: aws_sdk_cognitoidentityprovider::Client,
    config: Config,
}

impl AppState {
    async fn new() -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            secrets: aws_sdk_secretsmanager::Client::new(&aws_config),
            cognito: aws_sdk_cognitoidentityprovider::Client::new(&aws_config),
            config: Config::from_env(),
        }
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let request: RegisterRequest = match serde_json::from_slice(event.body().as_ref()) {
        Ok(parsed) => parsed,
        Err(e) => return error_response(400, e.to_string()),
    };

    let secret: CognitoSecret =
        match resolve_secret(&state.secrets, &state.config.cognito_secret_name).await {
            Ok(secret) => secret,
            Err(e) => return error_response(e.status_code(), e.to_string()),
        };

    let hash = secret_hash(&request.username, &secret.client_id, &secret.client_secret);

    let result = state
        .cognito
        .sign_up()
        .client_id(&secret.client_id)
        .secret_hash(hash)
        .username(&request.username)
        .password(&request.password)
        .user_attributes(
            AttributeType::builder()
                .name("email")
                .value(&request.email)
                .build()?,
        )
        .user_attributes(
            AttributeType::builder()
                .name("picture")
                .value(&request.picture)
                .build()?,
        )
        .send()
        .await;

    match result {
        Ok(response) => {
            info!("Registered user {}", request.username);
            json_response(
                200,
                &serde_json::json!({
                    "message": "User registration successful",
                    "user_sub": response.user_sub(),
                }),
            )
        }
        Err(e) => {
            let err = provider_error(&e);
            error_response(err.status_code(), err.to_string())
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
        let err = serde_json::from_value::<RegisterRequest>(serde_json::json!({
            "username": "ash",
            "password": "pikachu123"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_not_json_body_fails_to_parse() {
        let err = serde_json::from_slice::<RegisterRequest>(b"not json").unwrap_err();
        assert!(err.to_string().contains("line 1 column"));
    }
}
