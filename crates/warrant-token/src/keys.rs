//! Keypair management for token signing.

use crate::error::TokenError;
use ed25519_dalek::{SECRET_KEY_LENGTH, SigningKey, VerifyingKey};
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// An Ed25519 keypair for signing and verifying tokens.
#[derive(Clone)]
pub struct KeyPair {
    inner: SigningKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        rng.fill_bytes(&mut seed);

        Self {
            inner: SigningKey::from_bytes(&seed),
        }
    }

    /// Load a keypair from private key bytes.
    ///
    /// Accepts either the 32-byte seed or the 64-byte seed-plus-public-key
    /// form; the latter is checked for consistency.
    pub fn from_private_key_bytes(bytes: &[u8]) -> Result<Self, TokenError> {
        let inner = match bytes.len() {
            32 => {
                let seed: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| TokenError::InvalidPrivateKey("bad seed length".into()))?;
                SigningKey::from_bytes(&seed)
            }
            64 => {
                let pair: [u8; 64] = bytes
                    .try_into()
                    .map_err(|_| TokenError::InvalidPrivateKey("bad keypair length".into()))?;
                SigningKey::from_keypair_bytes(&pair)
                    .map_err(|e| TokenError::InvalidPrivateKey(e.to_string()))?
            }
            n => {
                return Err(TokenError::InvalidPrivateKey(format!(
                    "expected 32 or 64 bytes, got {n}"
                )));
            }
        };
        Ok(Self { inner })
    }

    /// Load a keypair from a hex-encoded private key string.
    pub fn from_private_key_hex(s: &str) -> Result<Self, TokenError> {
        let bytes = hex::decode(s.trim()).map_err(|e| TokenError::InvalidPrivateKey(e.to_string()))?;
        Self::from_private_key_bytes(&bytes)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }

    /// Get the private key seed.
    pub fn private_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.inner.to_bytes()
    }

    /// Get the public key.
    pub fn public_key(&self) -> VerifyingKey {
        self.inner.verifying_key()
    }

    /// Get the private key as hex string.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.inner.to_bytes())
    }

    /// Get the public key as hex string.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().as_bytes())
    }

    /// Save the keypair to files.
    pub fn save_to_files(
        &self,
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> Result<(), TokenError> {
        std::fs::write(private_key_path, self.private_key_hex())?;
        std::fs::write(public_key_path, self.public_key_hex())?;
        Ok(())
    }

    /// Load a keypair from a private key file.
    pub fn load_from_file(private_key_path: &Path) -> Result<Self, TokenError> {
        let hex = std::fs::read_to_string(private_key_path)?;
        Self::from_private_key_hex(hex.trim())
    }
}

/// Load a public key from raw bytes.
pub fn load_public_key_bytes(bytes: &[u8]) -> Result<VerifyingKey, TokenError> {
    let raw: [u8; 32] = bytes.try_into().map_err(|_| {
        TokenError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
    })?;
    VerifyingKey::from_bytes(&raw).map_err(|e| TokenError::InvalidPublicKey(e.to_string()))
}

/// Load a public key from hex string (for verification-only scenarios).
pub fn load_public_key_hex(s: &str) -> Result<VerifyingKey, TokenError> {
    let bytes = hex::decode(s.trim()).map_err(|e| TokenError::InvalidPublicKey(e.to_string()))?;
    load_public_key_bytes(&bytes)
}

/// Load a public key from a file.
pub fn load_public_key_file(path: &Path) -> Result<VerifyingKey, TokenError> {
    let hex = std::fs::read_to_string(path)?;
    load_public_key_hex(hex.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_keypair_generation() {
        let keypair = KeyPair::generate();
        assert_eq!(keypair.private_key_hex().len(), 64);
        assert_eq!(keypair.public_key_hex().len(), 64);
        assert_ne!(
            keypair.public_key_hex(),
            KeyPair::generate().public_key_hex()
        );
    }

    #[test]
    fn test_keypair_roundtrip() {
        let keypair1 = KeyPair::generate();
        let hex = keypair1.private_key_hex();

        let keypair2 = KeyPair::from_private_key_hex(&hex).unwrap();
        assert_eq!(keypair1.public_key_hex(), keypair2.public_key_hex());
    }

    #[test]
    fn test_keypair_from_64_byte_form() {
        let keypair = KeyPair::generate();
        let mut full = keypair.private_key_bytes().to_vec();
        full.extend_from_slice(keypair.public_key().as_bytes());

        let loaded = KeyPair::from_private_key_bytes(&full).unwrap();
        assert_eq!(loaded.public_key(), keypair.public_key());

        // Mismatched public half is rejected.
        let last = full.len() - 1;
        full[last] ^= 0x01;
        assert!(KeyPair::from_private_key_bytes(&full).is_err());
    }

    #[test]
    fn test_invalid_key_material() {
        assert!(matches!(
            KeyPair::from_private_key_bytes(&[0u8; 16]),
            Err(TokenError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            KeyPair::from_private_key_hex("not hex"),
            Err(TokenError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            load_public_key_bytes(&[0u8; 31]),
            Err(TokenError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_keypair_file_save_load() {
        let keypair = KeyPair::generate();

        let mut priv_file = NamedTempFile::new().unwrap();
        let mut pub_file = NamedTempFile::new().unwrap();

        writeln!(priv_file, "{}", keypair.private_key_hex()).unwrap();
        writeln!(pub_file, "{}", keypair.public_key_hex()).unwrap();

        let loaded = KeyPair::load_from_file(priv_file.path()).unwrap();
        assert_eq!(keypair.public_key_hex(), loaded.public_key_hex());

        let public = load_public_key_file(pub_file.path()).unwrap();
        assert_eq!(public, keypair.public_key());
    }
}
