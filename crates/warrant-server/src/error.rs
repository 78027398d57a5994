//! Error types for the token endpoint.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warrant_identity::IdentityError;

/// Errors answered by the token endpoint.
///
/// The first six carry an OAuth2 error code (RFC 6749 section 5.2) and are
/// reported to the client as HTTP 400; the rest are infrastructure failures
/// (HTTP 500).
#[derive(Debug, Error)]
pub enum GrantError {
    /// The request is missing a parameter or uses the wrong method.
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// Client authentication failed. Unknown clients and wrong secrets both
    /// map here.
    #[error("invalid_client: client authentication failed")]
    InvalidClient,

    /// No handler is registered for the grant type.
    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantType(String),

    /// The presented grant is invalid, expired or revoked.
    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    /// The client may not use this grant type.
    #[error("unauthorized_client: {0}")]
    UnauthorizedClient(String),

    /// The requested scope is invalid or exceeds what the client holds.
    #[error("invalid_scope: {0}")]
    InvalidScope(String),

    /// The request body could not be read as a form.
    #[error("failed to parse request body: {0}")]
    MalformedBody(String),

    /// The identity store did not answer.
    #[error("identity store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// OAuth2 error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    pub error_description: String,
}

impl GrantError {
    /// The OAuth2 `error` code, if this is a client-facing error.
    pub fn oauth_code(&self) -> Option<&'static str> {
        match self {
            GrantError::InvalidRequest(_) => Some("invalid_request"),
            GrantError::InvalidClient => Some("invalid_client"),
            GrantError::UnsupportedGrantType(_) => Some("unsupported_grant_type"),
            GrantError::InvalidGrant(_) => Some("invalid_grant"),
            GrantError::UnauthorizedClient(_) => Some("unauthorized_client"),
            GrantError::InvalidScope(_) => Some("invalid_scope"),
            GrantError::MalformedBody(_)
            | GrantError::StoreUnavailable(_)
            | GrantError::Internal(_) => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.oauth_code() {
            Some(_) => StatusCode::BAD_REQUEST,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn description(&self) -> String {
        match self {
            GrantError::InvalidRequest(msg)
            | GrantError::InvalidGrant(msg)
            | GrantError::UnauthorizedClient(msg)
            | GrantError::InvalidScope(msg) => msg.clone(),
            GrantError::InvalidClient => "client authentication failed".to_string(),
            GrantError::UnsupportedGrantType(grant_type) => {
                format!("grant type {grant_type:?} is not supported")
            }
            other => other.to_string(),
        }
    }
}

impl From<IdentityError> for GrantError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::StoreUnavailable(msg) => GrantError::StoreUnavailable(msg),
            other => GrantError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for GrantError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.oauth_code() {
            Some(code) => {
                tracing::info!(error = code, "token request rejected");
                let body = OAuthErrorBody {
                    error: code.to_string(),
                    error_description: self.description(),
                };
                (status, [(header::CACHE_CONTROL, "no-store")], Json(body)).into_response()
            }
            None => {
                tracing::error!(error = %self, "token request failed");
                (status, self.to_string()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GrantError::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GrantError::InvalidClient.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GrantError::UnsupportedGrantType("password".into()).oauth_code(),
            Some("unsupported_grant_type")
        );
        assert_eq!(
            GrantError::MalformedBody("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GrantError::from(IdentityError::StoreUnavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_grant_errors_render_oauth_body() {
        let cases = [
            (GrantError::InvalidGrant("expired".into()), "invalid_grant"),
            (
                GrantError::UnauthorizedClient("not allowed".into()),
                "unauthorized_client",
            ),
            (GrantError::InvalidScope("admin".into()), "invalid_scope"),
        ];
        for (err, code) in cases {
            let description = err.description();
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: OAuthErrorBody = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body.error, code);
            assert_eq!(body.error_description, description);
        }
    }

    #[test]
    fn test_invalid_client_description_is_uniform() {
        assert_eq!(
            GrantError::InvalidClient.description(),
            "client authentication failed"
        );
    }
}
