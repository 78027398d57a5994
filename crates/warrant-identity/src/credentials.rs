//! Client secret provisioning and verification.

use crate::error::CredentialError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Length of randomly generated secrets under the hashed scheme.
const HASHED_SECRET_LEN: usize = 16;

/// Which credential scheme a deployment uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScheme {
    /// Secrets derived from the client id and the master secret.
    #[default]
    Derived,
    /// Random secrets stored as per-client Argon2 hashes.
    Hashed,
}

impl fmt::Display for CredentialScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialScheme::Derived => f.write_str("derived"),
            CredentialScheme::Hashed => f.write_str("hashed"),
        }
    }
}

/// Secret material for a newly created client.
pub struct ProvisionedSecret {
    /// The plaintext secret handed to the client operator.
    pub plain_secret: String,
    /// What to persist with the client record, if anything.
    pub stored_secret: Option<String>,
}

/// Checks a presented client secret.
///
/// Implementations must fail closed: any internal error is a `false`.
pub trait CredentialVerifier: Send + Sync {
    fn scheme(&self) -> CredentialScheme;

    /// Create the secret for a freshly generated client id.
    fn provision(&self, client_id: &str) -> Result<ProvisionedSecret, CredentialError>;

    /// Check `presented_secret` for `client_id`.
    ///
    /// `stored_secret` is the value persisted at provisioning time, `None`
    /// when the client has no stored secret or was not found.
    fn verify(&self, client_id: &str, presented_secret: &str, stored_secret: Option<&str>) -> bool;

    /// Whether [`verify`](Self::verify) needs the client record first.
    fn requires_stored_secret(&self) -> bool {
        self.scheme() == CredentialScheme::Hashed
    }
}

/// Build the verifier for a scheme.
pub fn verifier_for(
    scheme: CredentialScheme,
    master_secret: &[u8],
) -> Result<Arc<dyn CredentialVerifier>, CredentialError> {
    Ok(match scheme {
        CredentialScheme::Derived => Arc::new(DerivedSecretVerifier::new(master_secret)?),
        CredentialScheme::Hashed => Arc::new(HashedSecretVerifier::new()?),
    })
}

/// Keyed derivation of client secrets from the master secret.
pub mod derive {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    fn mac(master_secret: &[u8], client_id: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(master_secret).ok()?;
        mac.update(client_id.as_bytes());
        Some(mac)
    }

    /// The secret for `client_id`, or `None` if the master secret is unusable.
    pub fn derive_secret(master_secret: &[u8], client_id: &str) -> Option<String> {
        let tag = mac(master_secret, client_id)?.finalize().into_bytes();
        Some(URL_SAFE_NO_PAD.encode(tag))
    }

    /// Constant-time check of a presented secret.
    pub fn verify(client_id: &str, presented_secret: &str, master_secret: &[u8]) -> bool {
        if master_secret.is_empty() {
            return false;
        }
        let Ok(presented) = URL_SAFE_NO_PAD.decode(presented_secret) else {
            return false;
        };
        match mac(master_secret, client_id) {
            Some(mac) => mac.verify_slice(&presented).is_ok(),
            None => false,
        }
    }
}

/// Canonical scheme: nothing is stored per client.
pub struct DerivedSecretVerifier {
    master_secret: Vec<u8>,
}

impl fmt::Debug for DerivedSecretVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedSecretVerifier").finish_non_exhaustive()
    }
}

impl DerivedSecretVerifier {
    pub fn new(master_secret: &[u8]) -> Result<Self, CredentialError> {
        if master_secret.is_empty() {
            return Err(CredentialError::InvalidMasterSecret("empty".into()));
        }
        Ok(Self {
            master_secret: master_secret.to_vec(),
        })
    }
}

impl CredentialVerifier for DerivedSecretVerifier {
    fn scheme(&self) -> CredentialScheme {
        CredentialScheme::Derived
    }

    fn provision(&self, client_id: &str) -> Result<ProvisionedSecret, CredentialError> {
        let plain_secret = derive::derive_secret(&self.master_secret, client_id)
            .ok_or_else(|| CredentialError::InvalidMasterSecret("rejected by HMAC".into()))?;
        Ok(ProvisionedSecret {
            plain_secret,
            stored_secret: None,
        })
    }

    fn verify(&self, client_id: &str, presented_secret: &str, _stored_secret: Option<&str>) -> bool {
        derive::verify(client_id, presented_secret, &self.master_secret)
    }
}

/// Legacy scheme: random secrets, Argon2 hash stored with the client.
pub struct HashedSecretVerifier {
    argon2: Argon2<'static>,
    /// Checked when the client has no stored hash so that unknown clients
    /// cost as much as known ones.
    dummy_hash: String,
}

impl HashedSecretVerifier {
    pub fn new() -> Result<Self, CredentialError> {
        let argon2 = Argon2::default();
        let dummy_hash = hash_secret(&argon2, b"warrant-dummy-client-secret")?;
        Ok(Self { argon2, dummy_hash })
    }
}

fn hash_secret(argon2: &Argon2<'_>, secret: &[u8]) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(secret, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::HashFailed(e.to_string()))
}

impl CredentialVerifier for HashedSecretVerifier {
    fn scheme(&self) -> CredentialScheme {
        CredentialScheme::Hashed
    }

    fn provision(&self, _client_id: &str) -> Result<ProvisionedSecret, CredentialError> {
        let mut raw = [0u8; HASHED_SECRET_LEN];
        rand::rng().fill_bytes(&mut raw);

        Ok(ProvisionedSecret {
            plain_secret: URL_SAFE_NO_PAD.encode(raw),
            stored_secret: Some(hash_secret(&self.argon2, &raw)?),
        })
    }

    fn verify(&self, _client_id: &str, presented_secret: &str, stored_secret: Option<&str>) -> bool {
        let Ok(raw) = URL_SAFE_NO_PAD.decode(presented_secret) else {
            return false;
        };
        let hash = stored_secret.unwrap_or(&self.dummy_hash);
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        let matched = self.argon2.verify_password(&raw, &parsed).is_ok();
        matched && stored_secret.is_some()
    }
}
