//! AWS Secrets Manager integration.
//!
//! Every handler pulls its credentials through [`resolve_secret`], which
//! normalizes all provider failure modes into a single classified outcome
//! carrying the status code the caller should see.

use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{Error, Result};

/// Database credentials from Secrets Manager (`sionpoKeys`).
#[derive(Debug, Deserialize)]
pub struct DatabaseSecret {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// User pool credentials from Secrets Manager (`cognitoKeys`).
#[derive(Debug, Deserialize)]
pub struct CognitoSecret {
    #[serde(rename = "USER_POOL_ID")]
    pub user_pool_id: String,
    #[serde(rename = "CLIENT_ID")]
    pub client_id: String,
    #[serde(rename = "CLIENT_SECRET")]
    pub client_secret: String,
}

/// Fetch a named secret bundle and deserialize its JSON payload.
///
/// One network call per invocation, no retry and no cache. Failures come
/// back as [`Error::Secret`] via [`classify_secret_error`].
pub async fn resolve_secret<T: DeserializeOwned>(
    client: &SecretsClient,
    name: &str,
) -> Result<T> {
    tracing::debug!("Resolving secret {}", name);

    let response = client
        .get_secret_value()
        .secret_id(name)
        .send()
        .await
        .map_err(|e| {
            let detail = format!("{}", DisplayErrorContext(&e));
            classify_secret_error(name, e.code(), &detail)
        })?;

    let secret_string = response.secret_string().ok_or_else(|| Error::Secret {
        status: 500,
        message: format!("Secret {} has no string value", name),
    })?;

    serde_json::from_str(secret_string).map_err(|e| Error::Secret {
        status: 500,
        message: format!("Secret {} could not be parsed: {}", name, e),
    })
}

/// Classify a secret-store failure into the status the caller should see.
///
/// The mapping is total: any provider code not in the table falls into the
/// 500 bucket with the underlying detail preserved. Secret values never
/// appear in the detail string, only provider metadata.
pub fn classify_secret_error(name: &str, code: Option<&str>, detail: &str) -> Error {
    let (status, message) = match code {
        Some("ResourceNotFoundException") => (404, format!("Secret {} not found", name)),
        Some("InvalidRequestException") => (400, format!("Invalid request for secret {}", name)),
        Some("InvalidParameterException") => {
            (400, format!("Invalid parameter for secret {}", name))
        }
        Some("AccessDeniedException") => (403, format!("Access denied for secret {}", name)),
        // Credential-chain failures surface without a service code; the
        // detail text is the only signal. Match the provider chain's own
        // phrases so a transport error that merely mentions a credentials
        // endpoint is not misreported as a 401.
        _ if detail.contains("incomplete credentials") || detail.contains("partial credentials") => {
            (401, format!("Incomplete credentials for secret {}", name))
        }
        _ if detail.contains("no credentials")
            || detail.contains("failed to load credentials")
            || detail.contains("the credential provider was not enabled") =>
        {
            (401, format!("Credentials not found for secret {}", name))
        }
        _ => (500, format!("Error retrieving secret {}: {}", name, detail)),
    };

    Error::Secret { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        let cases = [
            ("ResourceNotFoundException", 404),
            ("InvalidRequestException", 400),
            ("InvalidParameterException", 400),
            ("AccessDeniedException", 403),
        ];
        for (code, expected_status) in cases {
            let err = classify_secret_error("sionpoKeys", Some(code), "service error");
            assert_eq!(err.status_code(), expected_status, "code {}", code);
            assert!(
                err.to_string().contains("sionpoKeys"),
                "message must name the secret: {}",
                err
            );
        }
    }

    #[test]
    fn test_not_found_message() {
        let err = classify_secret_error("sionpoKeys", Some("ResourceNotFoundException"), "");
        assert_eq!(err.to_string(), "Secret sionpoKeys not found");
    }

    #[test]
    fn test_missing_credentials() {
        let err = classify_secret_error("cognitoKeys", None, "no credentials in the chain");
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "Credentials not found for secret cognitoKeys");

        let err = classify_secret_error(
            "cognitoKeys",
            None,
            "failed to load credentials from the environment",
        );
        assert_eq!(err.status_code(), 401);

        let err = classify_secret_error("cognitoKeys", None, "partial credentials found");
        assert_eq!(err.status_code(), 401);
        assert_eq!(
            err.to_string(),
            "Incomplete credentials for secret cognitoKeys"
        );
    }

    #[test]
    fn test_transport_error_mentioning_credentials_stays_500() {
        let err = classify_secret_error(
            "sionpoKeys",
            None,
            "dispatch failure: connection reset while reaching the credentials provider endpoint",
        );
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_unrecognized_code_falls_into_500() {
        let err = classify_secret_error(
            "sionpoKeys",
            Some("DecryptionFailure"),
            "KMS key unavailable",
        );
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("KMS key unavailable"));
    }

    #[test]
    fn test_parse_database_secret() {
        let json = r#"{"host":"db.example.com","username":"admin","password":"secret123"}"#;
        let secret: DatabaseSecret = serde_json::from_str(json).unwrap();
        assert_eq!(secret.host, "db.example.com");
        assert_eq!(secret.username, "admin");
        assert_eq!(secret.password, "secret123");
    }

    #[test]
    fn test_parse_cognito_secret() {
        let json = r#"{"USER_POOL_ID":"us-east-2_abc","CLIENT_ID":"client","CLIENT_SECRET":"shh"}"#;
        let secret: CognitoSecret = serde_json::from_str(json).unwrap();
        assert_eq!(secret.user_pool_id, "us-east-2_abc");
        assert_eq!(secret.client_id, "client");
        assert_eq!(secret.client_secret, "shh");
    }
}
