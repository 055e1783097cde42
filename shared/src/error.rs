//! Error types for SIONPO Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in SIONPO Lambda functions.
///
/// Display output is the caller-visible message, so variants carry it
/// verbatim rather than behind a prefix.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed body, missing field, or invalid enumerated value
    #[error("{0}")]
    Validation(String),

    /// Value outside its allowed range
    #[error("{0}")]
    Range(String),

    /// Secret store failure, already classified with a status code
    #[error("{message}")]
    Secret { status: u16, message: String },

    /// Store unreachable or timed out
    #[error("{0}")]
    Unavailable(String),

    /// Bad store credentials
    #[error("{0}")]
    Auth(String),

    /// Target row or entity absent
    #[error("{0}")]
    NotFound(String),

    /// Constraint violation
    #[error("{0}")]
    Integrity(String),

    /// Identity provider rejection, passed through to the caller
    #[error("{code}: {message}")]
    Provider { code: String, message: String },

    /// Serialization error
    #[error("{0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Range(_) => 422,
            Error::Secret { status, .. } => *status,
            Error::Unavailable(_) => 503,
            Error::Auth(_) => 401,
            Error::NotFound(_) => 404,
            Error::Integrity(_) => 422,
            Error::Provider { .. } => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Validation("bad".into()).status_code(), 400);
        assert_eq!(Error::Range("negative".into()).status_code(), 422);
        assert_eq!(Error::Unavailable("down".into()).status_code(), 503);
        assert_eq!(Error::Auth("denied".into()).status_code(), 401);
        assert_eq!(Error::NotFound("gone".into()).status_code(), 404);
        assert_eq!(Error::Integrity("duplicate".into()).status_code(), 422);
        assert_eq!(Error::Internal("boom".into()).status_code(), 500);
        assert_eq!(
            Error::Provider {
                code: "UserNotFoundException".into(),
                message: "no such user".into()
            }
            .status_code(),
            400
        );
        assert_eq!(
            Error::Secret {
                status: 403,
                message: "denied".into()
            }
            .status_code(),
            403
        );
    }

    #[test]
    fn test_display_is_caller_visible() {
        let err = Error::NotFound("Pokemon not found".into());
        assert_eq!(err.to_string(), "Pokemon not found");

        let err = Error::Provider {
            code: "NotAuthorizedException".into(),
            message: "Incorrect username or password.".into(),
        };
        assert_eq!(
            err.to_string(),
            "NotAuthorizedException: Incorrect username or password."
        );
    }
}
