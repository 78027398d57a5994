use crate::error::GrantError;
use crate::grant::{TokenRequest, authenticate};
use crate::state::AppState;
use axum::{
    Extension, Json,
    body::Bytes,
    http::{Method, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

/// OAuth2 token endpoint.
///
/// Checks run in a fixed order and the first failure answers: method, body,
/// client credentials, client record, grant type.
pub async fn token(
    Extension(state): Extension<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Result<Response, GrantError> {
    if method != Method::POST {
        return Err(GrantError::InvalidRequest(format!("invalid method {method}")));
    }

    let req = TokenRequest::from_form(&body)?;

    let (Some(client_id), Some(client_secret)) = (&req.client_id, &req.client_secret) else {
        return Err(GrantError::InvalidClient);
    };
    let client = authenticate(&state.identity, client_id, client_secret).await?;

    let Some(grant_type) = req.grant_type.as_deref() else {
        return Err(GrantError::InvalidRequest("missing grant_type".to_string()));
    };
    let Some(handler) = state.registry.get(grant_type) else {
        return Err(GrantError::UnsupportedGrantType(grant_type.to_string()));
    };

    let resp = handler.grant(&client, &req).await?;
    Ok((
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(resp),
    )
        .into_response())
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "warrant-server" }))
}

/// Token verification key, for resource servers.
pub async fn keys(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "algorithm": "ed25519",
        "public_key": state.public_key_hex,
    }))
}
