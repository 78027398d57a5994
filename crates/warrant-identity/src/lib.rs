//! # warrant-identity
//!
//! Identity records and key material for Warrant.
//!
//! This crate provides functionality for:
//! - Tenant and client records stored in an external document store
//! - Client secret provisioning and verification
//! - Durable secret material held in a secret-management service
//! - Administrative generation of the master secret and signing keypair
//!
//! ## Credential Schemes
//!
//! | Scheme | Stored per client | Secret |
//! |--------|-------------------|--------|
//! | `derived` (default) | nothing | `base64url(HMAC-SHA256(master_secret, client_id))` |
//! | `hashed` | Argon2id hash | random 16 bytes, base64url |
//!
//! Both schemes implement [`CredentialVerifier`] and can be swapped through
//! configuration. Under `derived`, a client secret can be re-derived by
//! anyone holding the master secret, so the master secret never leaves the
//! secret manager except to be loaded at process start.
//!
//! ## Collaborators
//!
//! The document store and the secret manager are consumed through the
//! [`DocumentStore`] and [`SecretManager`] traits. In-memory and
//! directory-backed implementations are included.

pub mod credentials;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod models;
pub mod secrets;
pub mod store;

pub use credentials::{
    CredentialScheme, CredentialVerifier, DerivedSecretVerifier, HashedSecretVerifier,
    ProvisionedSecret, verifier_for,
};
pub use error::{CredentialError, IdentityError, SecretError, StartupError, StoreError};
pub use identity::{AssetStore, IdentityStore};
pub use lifecycle::{KeyLifecycle, KeyMaterial, KeyVersions, load_key_material};
pub use models::{Client, Tenant, TenantId};
pub use secrets::{FileSecretManager, MemorySecretManager, SecretManager, SecretVersion};
pub use store::{Document, DocumentStore, FileDocumentStore, MemoryDocumentStore};
