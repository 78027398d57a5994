use crate::config::AppConfig;
use crate::grant::{ClientCredentialsGrant, GrantRegistry};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use warrant_identity::{
    CredentialScheme, DocumentStore, FileDocumentStore, FileSecretManager, IdentityStore,
    KeyMaterial, load_key_material, verifier_for,
};
use warrant_token::TokenIssuer;

/// Shared application state.
///
/// Built once at start and never mutated; request handlers only read it.
pub struct AppState {
    pub identity: IdentityStore,
    pub registry: GrantRegistry,
    pub public_key_hex: String,
    pub token_lifetime: Duration,
}

impl AppState {
    /// Assemble the state from loaded key material.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        keys: KeyMaterial,
        scheme: CredentialScheme,
        token_lifetime: Duration,
    ) -> anyhow::Result<Self> {
        let verifier = verifier_for(scheme, &keys.master_secret)
            .context("failed to build credential verifier")?;
        let public_key_hex = keys.signing_key.public_key_hex();

        let mut registry = GrantRegistry::new();
        registry.register(Arc::new(ClientCredentialsGrant::new(
            TokenIssuer::new(keys.signing_key),
            token_lifetime,
        )));

        Ok(Self {
            identity: IdentityStore::new(store, verifier),
            registry,
            public_key_hex,
            token_lifetime,
        })
    }

    /// Open the configured backends and load key material.
    ///
    /// Fails if either well-known secret is missing; the token endpoint
    /// cannot serve without them.
    pub async fn init(cfg: &AppConfig) -> anyhow::Result<Self> {
        let store = FileDocumentStore::open(&cfg.store.path)
            .await
            .with_context(|| format!("failed to open store {}", cfg.store.path.display()))?;
        let secrets = FileSecretManager::new(&cfg.secrets.path);
        let keys = load_key_material(&secrets, cfg.secrets.key_versions())
            .await
            .context("failed to load key material")?;

        tracing::info!(
            store = %cfg.store.path.display(),
            scheme = %cfg.credentials.scheme,
            lifetime = %cfg.token.lifetime,
            "token endpoint initialized"
        );
        Self::new(
            Arc::new(store),
            keys,
            cfg.credentials.scheme,
            cfg.token.lifetime()?,
        )
    }
}
