//! Token signing, envelope encoding and verification.

use crate::claims::{Claims, unix_now};
use crate::error::TokenError;
use crate::keys::KeyPair;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signature, Signer, VerifyingKey};
use warrant_codec::{DecodeLimits, Tag, Values};

/// Envelope entry holding the nested claims structure.
pub const TOKEN_VALUES: Tag = 1;

/// Envelope entry holding the signature over the encoded claims.
pub const TOKEN_SIGNATURE: Tag = 2;

/// Upper bound on a decoded envelope; claims are a few hundred bytes.
const TOKEN_LIMITS: DecodeLimits = DecodeLimits {
    max_depth: 4,
    max_size: 8 * 1024,
};

/// Sign a payload with the keypair's private key.
pub fn sign(payload: &[u8], keypair: &KeyPair) -> [u8; 64] {
    keypair.signing_key().sign(payload).to_bytes()
}

/// Verify a signature over a payload.
///
/// Returns `false` for malformed signatures as well as mismatches.
pub fn verify(payload: &[u8], signature: &[u8], public_key: &VerifyingKey) -> bool {
    match Signature::from_slice(signature) {
        Ok(signature) => public_key.verify_strict(payload, &signature).is_ok(),
        Err(_) => false,
    }
}

/// A decoded, not yet verified token envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The claims structure, including entries this version does not know.
    pub values: Values,
    /// Signature over `values.encode()`.
    pub signature: Vec<u8>,
}

impl Envelope {
    /// Sign `values` into a new envelope.
    pub fn seal(values: Values, keypair: &KeyPair) -> Self {
        let signature = sign(&values.encode(), keypair).to_vec();
        Self { values, signature }
    }

    /// Check the signature against a public key.
    pub fn verify_signature(&self, public_key: &VerifyingKey) -> bool {
        verify(&self.values.encode(), &self.signature, public_key)
    }

    /// The codec structure of the envelope.
    pub fn to_values(&self) -> Values {
        Values::new()
            .with(TOKEN_VALUES, self.values.clone())
            .with(TOKEN_SIGNATURE, self.signature.clone())
    }

    /// Encode for transport (base64url, no padding).
    pub fn to_token(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_values().encode())
    }

    /// Parse a transport token without checking its signature.
    pub fn from_token(token: &str) -> Result<Self, TokenError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| TokenError::TokenParseFailed(e.to_string()))?;
        let envelope = Values::decode_with(&raw, TOKEN_LIMITS)?;

        let values = envelope
            .get_nested(TOKEN_VALUES)
            .ok_or_else(|| TokenError::TokenParseFailed("envelope has no claims".into()))?
            .clone();
        let signature = envelope
            .get_bytes(TOKEN_SIGNATURE)
            .ok_or_else(|| TokenError::TokenParseFailed("envelope has no signature".into()))?
            .to_vec();

        Ok(Self { values, signature })
    }
}

/// Issues signed access tokens.
pub struct TokenIssuer {
    keypair: KeyPair,
}

impl TokenIssuer {
    /// Create a new token issuer with the given keypair.
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.keypair.public_key()
    }

    /// Sign claims and encode them as a bearer token.
    pub fn issue(&self, claims: &Claims) -> String {
        Envelope::seal(claims.to_values(), &self.keypair).to_token()
    }
}

/// Verifier for access tokens.
pub struct TokenVerifier {
    public_key: VerifyingKey,
}

impl TokenVerifier {
    /// Create a new token verifier with the given public key.
    pub fn new(public_key: VerifyingKey) -> Self {
        Self { public_key }
    }

    /// Verify a token against the current time and extract its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, unix_now())
    }

    /// Verify a token against the given time (Unix seconds).
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let claims = self.verify_signature_only(token)?;
        claims.check_validity_at(now)?;
        Ok(claims)
    }

    /// Verify the signature and decode the claims, ignoring the validity window.
    pub fn verify_signature_only(&self, token: &str) -> Result<Claims, TokenError> {
        let envelope = Envelope::from_token(token)?;
        if !envelope.verify_signature(&self.public_key) {
            tracing::debug!("token signature mismatch");
            return Err(TokenError::VerificationFailed("signature mismatch".into()));
        }
        Claims::from_values(&envelope.values)
    }
}

/// Information about a token (for inspection).
#[derive(Debug)]
pub struct TokenInfo {
    /// The raw claims structure.
    pub values: Values,
    /// Decoded claims, if all required claims are present.
    pub claims: Option<Claims>,
    /// Signature length in bytes.
    pub signature_len: usize,
}

/// Inspect a token without verification (for debugging).
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo, TokenError> {
    let envelope = Envelope::from_token(token)?;
    let claims = Claims::from_values(&envelope.values).ok();

    Ok(TokenInfo {
        signature_len: envelope.signature.len(),
        claims,
        values: envelope.values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{DEFAULT_TOKEN_LIFETIME, Scope, tags};
    use warrant_codec::Value;

    fn claims() -> Claims {
        Claims::new("AAECAwQFBgc", "c2xpZW50MQ", unix_now(), DEFAULT_TOKEN_LIFETIME)
            .with_scope(Scope::admin())
    }

    #[test]
    fn test_sign_and_verify_payload() {
        let keypair = KeyPair::generate();
        let signature = sign(b"payload", &keypair);

        assert!(verify(b"payload", &signature, &keypair.public_key()));
        assert!(!verify(b"payloaD", &signature, &keypair.public_key()));
        assert!(!verify(b"payload", &signature[..63], &keypair.public_key()));
        assert!(!verify(
            b"payload",
            &signature,
            &KeyPair::generate().public_key()
        ));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let keypair = KeyPair::generate();
        assert_eq!(sign(b"same", &keypair), sign(b"same", &keypair));
    }

    #[test]
    fn test_issue_and_verify_token() {
        let keypair = KeyPair::generate();
        let issuer = TokenIssuer::new(keypair.clone());
        let claims = claims();

        let token = issuer.issue(&claims);
        assert!(!token.is_empty());
        assert!(!token.contains('='));

        let verifier = TokenVerifier::new(keypair.public_key());
        let verified = verifier.verify(&token).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let issuer = TokenIssuer::new(KeyPair::generate());
        let token = issuer.issue(&claims());

        let verifier = TokenVerifier::new(KeyPair::generate().public_key());
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_every_claim_bit_flip_fails() {
        let keypair = KeyPair::generate();
        let payload = claims().to_values().encode();
        let signature = sign(&payload, &keypair);

        for byte in 0..payload.len() {
            for bit in 0..8 {
                let mut tampered = payload.clone();
                tampered[byte] ^= 1 << bit;
                assert!(
                    !verify(&tampered, &signature, &keypair.public_key()),
                    "flip at byte {byte} bit {bit} verified"
                );
            }
        }
    }

    #[test]
    fn test_tampered_envelope_rejected() {
        let keypair = KeyPair::generate();
        let envelope = Envelope::seal(claims().to_values(), &keypair);
        let raw = envelope.to_values().encode();
        let verifier = TokenVerifier::new(keypair.public_key());

        // The claims payload starts after the envelope's tag, kind and
        // one-byte length prefix.
        let claims_len = envelope.values.encode().len();
        for offset in 3..3 + claims_len {
            let mut tampered = raw.clone();
            tampered[offset] ^= 0x01;
            let token = URL_SAFE_NO_PAD.encode(&tampered);
            assert!(verifier.verify(&token).is_err(), "offset {offset} verified");
        }
    }

    #[test]
    fn test_unknown_claims_are_signed_and_kept() {
        let keypair = KeyPair::generate();
        let values = claims().to_values().with(77, "extension");
        let token = Envelope::seal(values.clone(), &keypair).to_token();

        let envelope = Envelope::from_token(&token).unwrap();
        assert!(envelope.verify_signature(&keypair.public_key()));
        assert_eq!(envelope.values, values);
        assert_eq!(envelope.values.get(77), Some(&Value::from("extension")));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keypair = KeyPair::generate();
        let issuer = TokenIssuer::new(keypair.clone());
        let claims = Claims::new("t", "c", 1_000, DEFAULT_TOKEN_LIFETIME);
        let token = issuer.issue(&claims);

        let verifier = TokenVerifier::new(keypair.public_key());
        assert!(verifier.verify_at(&token, 1_000).is_ok());
        assert!(matches!(
            verifier.verify_at(&token, claims.not_after),
            Err(TokenError::TokenExpired { .. })
        ));
        assert!(verifier.verify_signature_only(&token).is_ok());
    }

    #[test]
    fn test_garbage_tokens() {
        let verifier = TokenVerifier::new(KeyPair::generate().public_key());
        assert!(matches!(
            verifier.verify("!!!"),
            Err(TokenError::TokenParseFailed(_))
        ));
        // Valid base64 of an envelope without a signature.
        let token = URL_SAFE_NO_PAD.encode(
            Values::new()
                .with(TOKEN_VALUES, claims().to_values())
                .encode(),
        );
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::TokenParseFailed(_))
        ));
    }

    #[test]
    fn test_inspect_unverified() {
        let token = TokenIssuer::new(KeyPair::generate()).issue(&claims());
        let info = inspect_token_unverified(&token).unwrap();
        assert_eq!(info.signature_len, 64);
        assert_eq!(info.claims.unwrap().client_id, "c2xpZW50MQ");
        assert_eq!(info.values.get_str(tags::TENANT_ID), Some("AAECAwQFBgc"));
    }
}
