//! Confirm Register Lambda - confirms a sign-up with the emailed code.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared::cognito::{provider_error, secret_hash};
use shared::http::{error_response, json_response};
use shared::secrets::{resolve_secret, CognitoSecret};
use shared::Config;

/// Confirm register request
#[derive(Debug, Deserialize)]
struct ConfirmRegisterRequest {
    username: String,
    confirmation_code: String,
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
    let request: ConfirmRegisterRequest = match serde_json::from_slice(event.body().as_ref()) {
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
        .confirm_sign_up()
        .client_id(&secret.client_id)
        .username(&request.username)
        .confirmation_code(&request.confirmation_code)
        .secret_hash(hash)
        .send()
        .await;

    match result {
        Ok(_) => {
            info!("Confirmed user {}", request.username);
            json_response(
                200,
                &serde_json::json!({"message": "User account confirmed successfully"}),
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
    fn test_missing_confirmation_code_names_the_field() {
        let err = serde_json::from_value::<ConfirmRegisterRequest>(serde_json::json!({
            "username": "ash"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("confirmation_code"));
    }
}
