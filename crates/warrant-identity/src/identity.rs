//! Typed tenant/client operations over a [`DocumentStore`].

use crate::credentials::CredentialVerifier;
use crate::error::IdentityError;
use crate::models::{Client, Tenant, TenantId, random_id};
use crate::store::{ASSETS, CLIENTS, Document, DocumentStore, TENANTS};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::sync::Arc;

/// Tenant and client records.
///
/// Identifiers are random and no uniqueness check is made on insert, so
/// lookups return every matching record.
#[derive(Clone)]
pub struct IdentityStore {
    store: Arc<dyn DocumentStore>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl IdentityStore {
    pub fn new(store: Arc<dyn DocumentStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { store, verifier }
    }

    /// The credential verifier used to provision and check client secrets.
    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }

    /// Published assets stored alongside the identity records.
    pub fn assets(&self) -> AssetStore {
        AssetStore::new(self.store.clone())
    }

    pub async fn create_tenant(&self, description: &str) -> Result<Tenant, IdentityError> {
        let tenant = Tenant {
            id: TenantId::generate().to_string(),
            description: description.to_string(),
        };
        self.store.add(TENANTS, tenant.to_document()).await?;

        tracing::info!(tenant_id = %tenant.id, "tenant created");
        Ok(tenant)
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, IdentityError> {
        self.store
            .list(TENANTS)
            .await?
            .iter()
            .map(Tenant::from_document)
            .collect()
    }

    pub async fn get_tenant(&self, id: &str) -> Result<Vec<Tenant>, IdentityError> {
        self.store
            .query_eq(TENANTS, "id", id)
            .await?
            .iter()
            .map(Tenant::from_document)
            .collect()
    }

    /// Create a client under `tenant_id`.
    ///
    /// The returned record carries the plaintext secret; under the hashed
    /// scheme it cannot be recovered afterwards.
    pub async fn create_client(
        &self,
        tenant_id: &str,
        description: &str,
    ) -> Result<Client, IdentityError> {
        let tenant_id = TenantId::parse(tenant_id)?;
        let id = random_id();
        let secret = self.verifier.provision(&id)?;

        let client = Client {
            id,
            tenant_id: tenant_id.to_string(),
            description: description.to_string(),
            secret_hash: secret.stored_secret,
            plain_secret: Some(secret.plain_secret),
        };
        self.store.add(CLIENTS, client.to_document()).await?;

        tracing::info!(
            client_id = %client.id,
            tenant_id = %client.tenant_id,
            scheme = %self.verifier.scheme(),
            "client created"
        );
        Ok(client)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, IdentityError> {
        self.store
            .list(CLIENTS)
            .await?
            .iter()
            .map(Client::from_document)
            .collect()
    }

    pub async fn get_client(&self, id: &str) -> Result<Vec<Client>, IdentityError> {
        self.store
            .query_eq(CLIENTS, "id", id)
            .await?
            .iter()
            .map(Client::from_document)
            .collect()
    }
}

/// Named binary assets published next to the identity records.
#[derive(Clone)]
pub struct AssetStore {
    store: Arc<dyn DocumentStore>,
}

impl AssetStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Publish a new value for `name`; earlier values are kept.
    pub async fn put(&self, name: &str, data: &[u8]) -> Result<(), IdentityError> {
        let doc = Document::from([
            ("name".to_string(), name.to_string()),
            ("data".to_string(), URL_SAFE_NO_PAD.encode(data)),
        ]);
        self.store.add(ASSETS, doc).await?;
        Ok(())
    }

    /// The most recently published value for `name`.
    pub async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, IdentityError> {
        let docs = self.store.query_eq(ASSETS, "name", name).await?;
        let Some(doc) = docs.last() else {
            return Ok(None);
        };
        let data = doc
            .get("data")
            .ok_or_else(|| IdentityError::CorruptRecord(format!("asset {name} has no data")))?;
        URL_SAFE_NO_PAD
            .decode(data)
            .map(Some)
            .map_err(|e| IdentityError::CorruptRecord(format!("asset {name}: {e}")))
    }
}
