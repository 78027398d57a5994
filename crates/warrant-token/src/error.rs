//! Error types for the token crate.

use thiserror::Error;
use warrant_codec::CodecError;

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Failed to parse private key.
    #[error("failed to parse private key: {0}")]
    InvalidPrivateKey(String),

    /// Failed to parse public key.
    #[error("failed to parse public key: {0}")]
    InvalidPublicKey(String),

    /// Failed to parse token.
    #[error("failed to parse token: {0}")]
    TokenParseFailed(String),

    /// The token or its claims are not a valid encoding.
    #[error("token encoding error: {0}")]
    Encoding(#[from] CodecError),

    /// Token signature verification failed.
    #[error("token verification failed: {0}")]
    VerificationFailed(String),

    /// Token has expired.
    #[error("token has expired at {expired_at}")]
    TokenExpired { expired_at: u64 },

    /// Token is not valid yet.
    #[error("token is not valid before {not_before}")]
    TokenNotYetValid { not_before: u64 },

    /// Token is missing required claim.
    #[error("token missing required claim: {claim}")]
    MissingClaim { claim: &'static str },

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
