//! Login Lambda - password auth against the Cognito user pool.
//!
//! On success the caller gets the token set plus the user's pool groups;
//! the group lookup is best-effort and never fails a successful login.

use aws_sdk_cognitoidentityprovider::types::AuthFlowType;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shared::cognito::{provider_error, secret_hash};
use shared::http::{error_response, json_response};
use shared::secrets::{resolve_secret, CognitoSecret};
use shared::Config;

/// Login request
#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
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

async fn lookup_groups(state: &AppState, user_pool_id: &str, username: &str) -> Vec<String> {
    match state
        .cognito
        .admin_list_groups_for_user()
        .user_pool_id(user_pool_id)
        .username(username)
        .send()
        .await
    {
        Ok(response) => response
            .groups()
            .iter()
            .filter_map(|g| g.group_name().map(str::to_string))
            .collect(),
        Err(e) => {
            warn!("Group lookup failed for {}: {}", username, e);
            Vec::new()
        }
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let request: LoginRequest = match serde_json::from_slice(event.body().as_ref()) {
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
        .initiate_auth()
        .client_id(&secret.client_id)
        .auth_flow(AuthFlowType::UserPasswordAuth)
        .auth_parameters("USERNAME", &request.username)
        .auth_parameters("PASSWORD", &request.password)
        .auth_parameters("SECRET_HASH", hash)
        .send()
        .await;

    match result {
        Ok(response) => {
            let authentication_result = response.authentication_result().map(|tokens| {
                serde_json::json!({
                    "AccessToken": tokens.access_token(),
                    "ExpiresIn": tokens.expires_in(),
                    "TokenType": tokens.token_type(),
                    "RefreshToken": tokens.refresh_token(),
                    "IdToken": tokens.id_token(),
                })
            });

            let groups = lookup_groups(&state, &secret.user_pool_id, &request.username).await;

            info!("User {} logged in", request.username);
            json_response(
                200,
                &serde_json::json!({
                    "message": "User login successful",
                    "authentication_result": authentication_result,
                    "groups": groups,
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
    fn test_missing_password_names_the_field() {
        let err = serde_json::from_value::<LoginRequest>(serde_json::json!({
            "username": "ash"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("password"));
    }
}
