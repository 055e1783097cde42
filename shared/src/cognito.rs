//! Cognito helpers shared by the identity handlers.

use aws_sdk_cognitoidentityprovider::error::{ProvideErrorMetadata, SdkError};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::Error;

type HmacSha256 = Hmac<Sha256>;

/// Keyed hash required by the user pool client protocol: HMAC-SHA256 over
/// `username + client_id`, keyed by the client secret, base64-encoded.
pub fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Map a user pool call failure onto our taxonomy.
///
/// Service rejections (bad credentials, duplicate user, invalid confirmation
/// code) pass through with the provider's own code and message as a 400;
/// anything without a service code is an internal fault.
pub fn provider_error<E, R>(err: &SdkError<E, R>) -> Error
where
    SdkError<E, R>: ProvideErrorMetadata + std::fmt::Display,
{
    match err.code() {
        Some(code) => Error::Provider {
            code: code.to_string(),
            message: err
                .message()
                .unwrap_or("Request rejected by the identity provider")
                .to_string(),
        },
        None => Error::Internal(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_hash_is_deterministic() {
        let a = secret_hash("ash", "client-id", "client-secret");
        let b = secret_hash("ash", "client-id", "client-secret");
        assert_eq!(a, b);
    }

    #[test]
    fn test_secret_hash_depends_on_all_inputs() {
        let base = secret_hash("ash", "client-id", "client-secret");
        assert_ne!(base, secret_hash("misty", "client-id", "client-secret"));
        assert_ne!(base, secret_hash("ash", "other-client", "client-secret"));
        assert_ne!(base, secret_hash("ash", "client-id", "other-secret"));
    }

    #[test]
    fn test_secret_hash_is_base64_of_sha256_digest() {
        let hash = secret_hash("ash", "client-id", "client-secret");
        let digest = general_purpose::STANDARD.decode(hash).unwrap();
        assert_eq!(digest.len(), 32);
    }
}
