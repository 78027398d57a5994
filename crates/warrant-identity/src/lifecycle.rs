//! Master secret and signing key management.
//!
//! Administrative operations create new versions of the well-known secrets;
//! the token endpoint reads them once at start through
//! [`load_key_material`].

use crate::error::{IdentityError, StartupError};
use crate::identity::AssetStore;
use crate::secrets::{SecretManager, SecretVersion};
use rand::RngCore;
use std::fmt;
use std::sync::Arc;
use warrant_token::{KeyPair, PublicKey};

/// Secret holding the master secret used to derive client secrets.
pub const CLIENT_ID_SECRET: &str = "client-id-secret";

/// Secret holding the Ed25519 private key (32-byte seed) used to sign tokens.
pub const TOKEN_SIGNATURE_KEY: &str = "token-signature-key";

/// Asset holding the raw 32-byte public key matching the signing key.
pub const ASSET_AUTH_PUBKEY: &str = "auth-pubkey";

/// Length of a freshly generated master secret.
pub const MASTER_SECRET_LEN: usize = 64;

/// Creates and reads the long-lived secrets.
#[derive(Clone)]
pub struct KeyLifecycle {
    secrets: Arc<dyn SecretManager>,
    assets: AssetStore,
}

impl KeyLifecycle {
    pub fn new(secrets: Arc<dyn SecretManager>, assets: AssetStore) -> Self {
        Self { secrets, assets }
    }

    /// Generate a new master secret version.
    ///
    /// Every derived client secret changes with it; clients created under
    /// the old version stop authenticating once the server loads the new one.
    pub async fn create_master_secret(&self) -> Result<u32, IdentityError> {
        let mut secret = vec![0u8; MASTER_SECRET_LEN];
        rand::rng().fill_bytes(&mut secret);

        let version = self.secrets.create(CLIENT_ID_SECRET, &secret).await?;
        tracing::info!(secret = CLIENT_ID_SECRET, version, "master secret created");
        Ok(version)
    }

    /// Generate a new signing keypair and publish its public key.
    pub async fn create_signing_keypair(&self) -> Result<(u32, PublicKey), IdentityError> {
        let keypair = KeyPair::generate();
        let public_key = keypair.public_key();

        let version = self
            .secrets
            .create(TOKEN_SIGNATURE_KEY, &keypair.private_key_bytes())
            .await?;
        self.assets
            .put(ASSET_AUTH_PUBKEY, public_key.as_bytes())
            .await?;

        tracing::info!(
            secret = TOKEN_SIGNATURE_KEY,
            version,
            public_key = %keypair.public_key_hex(),
            "signing keypair created"
        );
        Ok((version, public_key))
    }

    /// Raw secret bytes.
    pub async fn get(&self, name: &str, version: SecretVersion) -> Result<Vec<u8>, IdentityError> {
        Ok(self.secrets.get(name, version).await?)
    }

    /// Public half of a stored signing key version.
    pub async fn signing_public_key(
        &self,
        version: SecretVersion,
    ) -> Result<PublicKey, IdentityError> {
        let seed = self.secrets.get(TOKEN_SIGNATURE_KEY, version).await?;
        Ok(KeyPair::from_private_key_bytes(&seed)?.public_key())
    }

    /// The most recently published token public key, if any.
    pub async fn published_public_key(&self) -> Result<Option<PublicKey>, IdentityError> {
        match self.assets.get(ASSET_AUTH_PUBKEY).await? {
            Some(bytes) => Ok(Some(warrant_token::keys::load_public_key_bytes(&bytes)?)),
            None => Ok(None),
        }
    }
}

/// Versions of the well-known secrets to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyVersions {
    pub master_secret: SecretVersion,
    pub signing_key: SecretVersion,
}

/// Secret material held by the token endpoint for its lifetime.
pub struct KeyMaterial {
    pub master_secret: Vec<u8>,
    pub signing_key: KeyPair,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("public_key", &self.signing_key.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Load the master secret and signing key.
///
/// Failure leaves nothing half-initialized; the caller decides whether to
/// exit or retry.
pub async fn load_key_material(
    secrets: &dyn SecretManager,
    versions: KeyVersions,
) -> Result<KeyMaterial, StartupError> {
    let master_secret = secrets
        .get(CLIENT_ID_SECRET, versions.master_secret)
        .await
        .map_err(|source| StartupError::MissingSecret {
            name: CLIENT_ID_SECRET,
            source,
        })?;
    if master_secret.is_empty() {
        return Err(StartupError::EmptyMasterSecret(CLIENT_ID_SECRET));
    }

    let seed = secrets
        .get(TOKEN_SIGNATURE_KEY, versions.signing_key)
        .await
        .map_err(|source| StartupError::MissingSecret {
            name: TOKEN_SIGNATURE_KEY,
            source,
        })?;
    let signing_key = KeyPair::from_private_key_bytes(&seed)?;

    tracing::info!(
        public_key = %signing_key.public_key_hex(),
        master_secret_version = %versions.master_secret,
        signing_key_version = %versions.signing_key,
        "key material loaded"
    );
    Ok(KeyMaterial {
        master_secret,
        signing_key,
    })
}
