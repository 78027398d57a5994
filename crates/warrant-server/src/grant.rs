//! Token request parsing, client authentication and grant dispatch.

use crate::error::GrantError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use warrant_identity::{Client, IdentityStore};
use warrant_token::{Claims, Scope, TokenIssuer, unix_now};

/// The one grant type this server issues tokens for.
pub const CLIENT_CREDENTIALS: &str = "client_credentials";

/// Parameters of a token request.
///
/// Empty values are treated as absent. When a parameter repeats, the first
/// occurrence wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl TokenRequest {
    /// Parse an `application/x-www-form-urlencoded` body.
    pub fn from_form(body: &[u8]) -> Result<Self, GrantError> {
        let body = std::str::from_utf8(body).map_err(|e| GrantError::MalformedBody(e.to_string()))?;

        let mut req = TokenRequest::default();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            let slot = match key.as_ref() {
                "grant_type" => &mut req.grant_type,
                "client_id" => &mut req.client_id,
                "client_secret" => &mut req.client_secret,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        Ok(req)
    }
}

/// Successful token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Issues a token for an authenticated client under one grant type.
#[async_trait]
pub trait GrantHandler: Send + Sync {
    /// The `grant_type` value this handler answers.
    fn grant_type(&self) -> &'static str;

    async fn grant(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> Result<TokenResponse, GrantError>;
}

/// Grant handlers keyed by grant type.
#[derive(Clone, Default)]
pub struct GrantRegistry {
    handlers: HashMap<String, Arc<dyn GrantHandler>>,
}

impl GrantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same type.
    pub fn register(&mut self, handler: Arc<dyn GrantHandler>) {
        self.handlers
            .insert(handler.grant_type().to_string(), handler);
    }

    pub fn get(&self, grant_type: &str) -> Option<Arc<dyn GrantHandler>> {
        self.handlers.get(grant_type).cloned()
    }

    pub fn grant_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

/// OAuth2 `client_credentials`: a signed token naming the client and its
/// tenant, with the admin scope.
pub struct ClientCredentialsGrant {
    issuer: TokenIssuer,
    lifetime: Duration,
}

impl ClientCredentialsGrant {
    pub fn new(issuer: TokenIssuer, lifetime: Duration) -> Self {
        Self { issuer, lifetime }
    }
}

#[async_trait]
impl GrantHandler for ClientCredentialsGrant {
    fn grant_type(&self) -> &'static str {
        CLIENT_CREDENTIALS
    }

    async fn grant(
        &self,
        client: &Client,
        _request: &TokenRequest,
    ) -> Result<TokenResponse, GrantError> {
        let claims = Claims::new(&client.tenant_id, &client.id, unix_now(), self.lifetime)
            .with_scope(Scope::admin());
        let token = self.issuer.issue(&claims);

        tracing::info!(
            client_id = %client.id,
            tenant_id = %client.tenant_id,
            not_after = claims.not_after,
            "access token issued"
        );
        Ok(TokenResponse::bearer(token))
    }
}

/// Resolve the client for a presented id and secret.
///
/// Under the derived scheme the secret is checked before any store lookup.
/// Under the hashed scheme every record with the id is tried against its
/// stored hash; with no records the verifier still runs against a dummy
/// hash. Every failure is [`GrantError::InvalidClient`] except a store
/// failure.
pub async fn authenticate(
    identity: &IdentityStore,
    client_id: &str,
    client_secret: &str,
) -> Result<Client, GrantError> {
    let verifier = identity.verifier();

    if !verifier.requires_stored_secret() {
        if !verifier.verify(client_id, client_secret, None) {
            tracing::debug!(client_id, "client secret mismatch");
            return Err(GrantError::InvalidClient);
        }
        let clients = identity.get_client(client_id).await?;
        return clients.into_iter().next().ok_or_else(|| {
            tracing::debug!(client_id, "client record not found");
            GrantError::InvalidClient
        });
    }

    let clients = identity.get_client(client_id).await?;
    if clients.is_empty() {
        let _ = verifier.verify(client_id, client_secret, None);
        tracing::debug!(client_id, "client record not found");
        return Err(GrantError::InvalidClient);
    }
    clients
        .into_iter()
        .find(|c| verifier.verify(&c.id, client_secret, c.secret_hash.as_deref()))
        .ok_or_else(|| {
            tracing::debug!(client_id, "client secret mismatch");
            GrantError::InvalidClient
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form() {
        let req = TokenRequest::from_form(
            b"grant_type=client_credentials&client_id=abc&client_secret=a%2Bb%3D&extra=1",
        )
        .unwrap();
        assert_eq!(req.grant_type.as_deref(), Some(CLIENT_CREDENTIALS));
        assert_eq!(req.client_id.as_deref(), Some("abc"));
        assert_eq!(req.client_secret.as_deref(), Some("a+b="));
    }

    #[test]
    fn test_parse_form_empty_and_repeated() {
        let req = TokenRequest::from_form(b"client_id=&client_id=first&client_id=second").unwrap();
        assert_eq!(req.client_id.as_deref(), Some("first"));
        assert_eq!(req.client_secret, None);
        assert_eq!(TokenRequest::from_form(b"").unwrap(), TokenRequest::default());
    }

    #[test]
    fn test_parse_form_rejects_non_utf8() {
        assert!(matches!(
            TokenRequest::from_form(&[0x63, 0x3d, 0xff, 0xfe]),
            Err(GrantError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_registry() {
        let mut registry = GrantRegistry::new();
        assert!(registry.get(CLIENT_CREDENTIALS).is_none());

        let issuer = TokenIssuer::new(warrant_token::KeyPair::generate());
        registry.register(Arc::new(ClientCredentialsGrant::new(
            issuer,
            Duration::from_secs(60),
        )));
        assert!(registry.get(CLIENT_CREDENTIALS).is_some());
        assert!(registry.get("password").is_none());
        assert_eq!(registry.grant_types(), vec![CLIENT_CREDENTIALS]);
    }
}
