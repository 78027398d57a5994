//! # warrant-server
//!
//! OAuth2 token endpoint issuing Warrant access tokens.
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/token` | POST | `client_credentials` grant |
//! | `/keys` | GET | hex-encoded Ed25519 verification key |
//! | `/healthz` | GET | liveness |

pub mod config;
pub mod error;
pub mod grant;
pub mod handlers;
pub mod state;

pub use config::{AppConfig, load_config, load_config_from};
pub use error::{GrantError, OAuthErrorBody};
pub use grant::{
    CLIENT_CREDENTIALS, ClientCredentialsGrant, GrantHandler, GrantRegistry, TokenRequest,
    TokenResponse, authenticate,
};
pub use state::AppState;

use axum::{
    Extension, Router,
    routing::{any, get},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/token", any(handlers::token))
        .route("/keys", get(handlers::keys))
        .route("/healthz", get(handlers::healthz))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
