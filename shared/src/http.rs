//! HTTP helpers for Lambda functions.
//!
//! Every handler, regardless of outcome, returns a `{statusCode, body}`
//! envelope with a JSON-encoded body. The relational handlers use a
//! `{"message": …}` body; the identity handlers use `{"error": …}` for
//! failures, matching their callers' expectations.

use lambda_http::{Body, Response};
use serde::Serialize;

use crate::Error;

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(
    status: u16,
    data: &T,
) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .expect("Failed to build response"))
}

/// `{"message": …}` response used by the relational handlers.
pub fn message_response(
    status: u16,
    message: impl Into<String>,
) -> Result<Response<Body>, lambda_http::Error> {
    let message: String = message.into();
    json_response(status, &serde_json::json!({ "message": message }))
}

/// `{"error": …}` response used by the identity handlers.
pub fn error_response(
    status: u16,
    message: impl Into<String>,
) -> Result<Response<Body>, lambda_http::Error> {
    let message: String = message.into();
    json_response(status, &serde_json::json!({ "error": message }))
}

/// Convert a classified error into its caller-visible response.
pub fn failure_response(err: &Error) -> Result<Response<Body>, lambda_http::Error> {
    message_response(err.status_code(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_text(response: &Response<Body>) -> &str {
        std::str::from_utf8(response.body().as_ref()).unwrap()
    }

    #[test]
    fn test_message_response() {
        let response = message_response(404, "Pokemon not found").unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(body_text(&response), r#"{"message":"Pokemon not found"}"#);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_error_response() {
        let response = error_response(400, "Missing username").unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(body_text(&response), r#"{"error":"Missing username"}"#);
    }

    #[test]
    fn test_failure_response_carries_classified_status() {
        let err = Error::Secret {
            status: 404,
            message: "Secret sionpoKeys not found".into(),
        };
        let response = failure_response(&err).unwrap();
        assert_eq!(response.status(), 404);
        assert!(body_text(&response).contains("Secret sionpoKeys not found"));
    }

    #[test]
    fn test_json_response_serializes_data() {
        let rows = vec![serde_json::json!({"id_pokemon": 1})];
        let response = json_response(200, &rows).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(body_text(&response), r#"[{"id_pokemon":1}]"#);
    }
}
