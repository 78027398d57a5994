//! # warrant-token
//!
//! Signed bearer tokens for Warrant.
//!
//! This crate provides functionality for:
//! - Generating and loading Ed25519 keypairs for token signing
//! - Building the claims carried by an access token
//! - Signing claims into an opaque, base64url-encoded envelope
//! - Verifying envelopes and extracting their claims
//!
//! ## Envelope Format
//!
//! Both the claims and the envelope are [`warrant_codec::Values`]
//! structures:
//!
//! | Tag | Envelope entry | Kind |
//! |-----|----------------|------|
//! | 1 | claims | nested |
//! | 2 | Ed25519 signature over the encoded claims | bytes |
//!
//! | Tag | Claim | Kind |
//! |-----|-------|------|
//! | 1 | tenant id | string |
//! | 2 | client id | string |
//! | 3 | not-before (Unix seconds) | uint64 |
//! | 4 | not-after (Unix seconds) | uint64 |
//! | 5 | scope (`1` = admin flag) | nested |
//!
//! The encoded envelope is base64url-encoded without padding for transport.
//! The envelope carries no key identifier: a verifier holds exactly one
//! public key.

pub mod claims;
pub mod error;
pub mod keys;
pub mod token;

pub use claims::{Claims, DEFAULT_TOKEN_LIFETIME, Scope, unix_now};
pub use ed25519_dalek::VerifyingKey as PublicKey;
pub use error::TokenError;
pub use keys::KeyPair;
pub use token::{
    Envelope, TokenInfo, TokenIssuer, TokenVerifier, inspect_token_unverified, sign, verify,
};
