//! CLI command implementations for Warrant administration.

pub mod client;
pub mod key;
pub mod tenant;
pub mod token;

use anyhow::Context as _;
use std::path::PathBuf;
use std::sync::Arc;
use warrant_identity::lifecycle::CLIENT_ID_SECRET;
use warrant_identity::{
    AssetStore, CredentialScheme, FileDocumentStore, FileSecretManager, IdentityStore,
    KeyLifecycle, SecretManager, SecretVersion, verifier_for,
};

/// Backends the commands operate on.
#[derive(Debug, Clone)]
pub struct Context {
    pub store: PathBuf,
    pub secrets: PathBuf,
    pub scheme: CredentialScheme,
    /// Master secret version client secrets are derived from; must match
    /// the server's `[secrets] master_secret_version`.
    pub master_secret_version: SecretVersion,
}

impl Context {
    async fn document_store(&self) -> anyhow::Result<Arc<FileDocumentStore>> {
        let store = FileDocumentStore::open(&self.store)
            .await
            .with_context(|| format!("Failed to open store {}", self.store.display()))?;
        Ok(Arc::new(store))
    }

    fn secret_manager(&self) -> Arc<dyn SecretManager> {
        Arc::new(FileSecretManager::new(&self.secrets))
    }

    /// Identity records with the credential verifier for the active scheme.
    ///
    /// The derived scheme needs the master secret, so `warrant key create
    /// client-id-secret` must have run first.
    pub async fn identity(&self) -> anyhow::Result<IdentityStore> {
        let master_secret = match self.scheme {
            CredentialScheme::Derived => self
                .secret_manager()
                .get(CLIENT_ID_SECRET, self.master_secret_version)
                .await
                .with_context(|| {
                    format!(
                        "Failed to load {CLIENT_ID_SECRET} version {}. Create it with `warrant key create {CLIENT_ID_SECRET}`",
                        self.master_secret_version
                    )
                })?,
            CredentialScheme::Hashed => Vec::new(),
        };
        let verifier = verifier_for(self.scheme, &master_secret)?;
        Ok(IdentityStore::new(self.document_store().await?, verifier))
    }

    pub async fn lifecycle(&self) -> anyhow::Result<KeyLifecycle> {
        let assets = AssetStore::new(self.document_store().await?);
        Ok(KeyLifecycle::new(self.secret_manager(), assets))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A context rooted in a temporary directory, with a master secret.
    pub async fn context(dir: &std::path::Path, scheme: CredentialScheme) -> Context {
        let ctx = Context {
            store: dir.join("store"),
            secrets: dir.join("secrets"),
            scheme,
            master_secret_version: SecretVersion::Latest,
        };
        ctx.lifecycle()
            .await
            .unwrap()
            .create_master_secret()
            .await
            .unwrap();
        ctx
    }

    pub fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::context;
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_identity_follows_pinned_master_secret() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), CredentialScheme::Derived).await;
        let lifecycle = ctx.lifecycle().await.unwrap();
        lifecycle.create_master_secret().await.unwrap();

        let first = lifecycle
            .get(CLIENT_ID_SECRET, SecretVersion::Version(1))
            .await
            .unwrap();
        let pinned = Context {
            master_secret_version: SecretVersion::Version(1),
            ..ctx.clone()
        };

        let identity = pinned.identity().await.unwrap();
        let tenant = identity.create_tenant("acme").await.unwrap();
        let client = identity.create_client(&tenant.id, "ci runner").await.unwrap();
        let secret = client.plain_secret.unwrap();

        // A server pinned to version 1 accepts the secret; one on the
        // latest version does not.
        let server_v1 = verifier_for(CredentialScheme::Derived, &first).unwrap();
        assert!(server_v1.verify(&client.id, &secret, None));
        let latest = ctx.identity().await.unwrap();
        assert!(!latest.verifier().verify(&client.id, &secret, None));
    }

    #[tokio::test]
    async fn test_identity_missing_pinned_version() {
        let dir = tempdir().unwrap();
        let ctx = Context {
            master_secret_version: SecretVersion::Version(7),
            ..context(dir.path(), CredentialScheme::Derived).await
        };
        let err = ctx.identity().await.err().unwrap();
        assert!(format!("{err:#}").contains("version 7"));
    }
}
