//! Configuration management for Lambda functions.

use std::env;

/// Application configuration loaded from environment variables.
///
/// Every field has a stack default so a handler can boot without any
/// environment wiring; overrides exist for test and staging pools.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the secret holding database credentials
    pub db_secret_name: String,
    /// Database schema name
    pub db_name: String,
    /// Name of the secret holding user pool credentials
    pub cognito_secret_name: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            db_secret_name: env::var("DB_SECRET_NAME")
                .unwrap_or_else(|_| "sionpoKeys".to_string()),
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "SIONPO".to_string()),
            cognito_secret_name: env::var("COGNITO_SECRET_NAME")
                .unwrap_or_else(|_| "cognitoKeys".to_string()),
        }
    }
}
