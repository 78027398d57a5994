//! Error types for the identity crate.

use thiserror::Error;
use warrant_token::TokenError;

/// Errors reported by a [`DocumentStore`](crate::DocumentStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or did not answer.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// The store returned data that could not be read.
    #[error("corrupt document: {0}")]
    Corrupt(String),
}

/// Errors reported by a [`SecretManager`](crate::SecretManager) backend.
#[derive(Debug, Error)]
pub enum SecretError {
    /// No secret (or no such version) exists under the name.
    #[error("secret {name} version {version} not found")]
    NotFound { name: String, version: String },

    /// Secret names are restricted to ASCII letters, digits, `-` and `_`.
    #[error("invalid secret name: {0:?}")]
    InvalidName(String),

    /// Another writer allocated the same version first.
    #[error("secret {name} version {version} already exists")]
    VersionConflict { name: String, version: u32 },

    /// The secret manager could not be reached.
    #[error("secret manager unavailable: {0}")]
    Unavailable(String),
}

/// Errors from provisioning client credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The master secret is unusable.
    #[error("invalid master secret: {0}")]
    InvalidMasterSecret(String),

    /// Password hashing failed.
    #[error("failed to hash client secret: {0}")]
    HashFailed(String),
}

/// Errors from the identity store adapter.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The tenant id is not a base64url-encoded 8-byte value.
    #[error("invalid tenant id {0:?}")]
    InvalidTenantId(String),

    /// The underlying document store failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored record is missing fields or has invalid values.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// Credential provisioning failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Key lifecycle operation on a secret failed.
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Key material could not be parsed.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => IdentityError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => IdentityError::CorruptRecord(msg),
        }
    }
}

/// Errors loading key material at process start.
///
/// Any of these means the token endpoint cannot serve; the caller decides
/// whether to exit or retry.
#[derive(Debug, Error)]
pub enum StartupError {
    /// A required secret could not be read.
    #[error("failed to load secret {name}: {source}")]
    MissingSecret {
        name: &'static str,
        #[source]
        source: SecretError,
    },

    /// The stored master secret is empty.
    #[error("master secret {0} is empty")]
    EmptyMasterSecret(&'static str),

    /// The stored signing key is not a valid Ed25519 private key.
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(#[from] TokenError),
}
