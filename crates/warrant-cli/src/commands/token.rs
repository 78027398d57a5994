//! Token commands.
//!
//! `warrant token inspect` - Decode a token, optionally verifying its signature.

use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::Path;
use warrant_token::{PublicKey, TokenVerifier, inspect_token_unverified};

/// Resolve a public key from either a file path or a hex-encoded string.
pub fn resolve_public_key(key: &str) -> anyhow::Result<PublicKey> {
    let path = Path::new(key);
    if path.exists() {
        return warrant_token::keys::load_public_key_file(path)
            .with_context(|| format!("Failed to load public key from file: {}", path.display()));
    }

    warrant_token::keys::load_public_key_hex(key.trim())
        .context("Failed to parse public key. Expected hex-encoded Ed25519 public key")
}

/// Read a token given inline or as a path to a file holding it.
pub fn resolve_token(token: &str) -> anyhow::Result<String> {
    let path = Path::new(token);
    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read token from {}", path.display()))?;
        return Ok(raw.trim().to_string());
    }
    Ok(token.trim().to_string())
}

/// Print a token's claims. With a public key, also verify it and fail if
/// the signature or validity window does not check out.
pub fn inspect(
    token: &str,
    public_key: Option<PublicKey>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let info = inspect_token_unverified(token).context("Failed to decode token")?;

    writeln!(out, "Token Information:")?;
    match &info.claims {
        Some(claims) => {
            writeln!(out, "  Tenant ID:  {}", claims.tenant_id)?;
            writeln!(out, "  Client ID:  {}", claims.client_id)?;
            writeln!(out, "  Not before: {}", format_time(claims.not_before))?;
            writeln!(out, "  Not after:  {}", format_time(claims.not_after))?;
            writeln!(
                out,
                "  Scope:      {}",
                if claims.scope.admin { "admin" } else { "(none)" }
            )?;
        }
        None => {
            writeln!(out, "  (incomplete claims)")?;
            for (tag, value) in info.values.iter() {
                writeln!(out, "  {tag}: {value:?}")?;
            }
        }
    }
    writeln!(out, "  Signature:  {} bytes", info.signature_len)?;

    if let Some(public_key) = public_key {
        writeln!(out)?;
        match TokenVerifier::new(public_key).verify(token) {
            Ok(_) => writeln!(out, "✔ Token is valid")?,
            Err(e) => {
                writeln!(out, "✖ Token verification failed: {e}")?;
                anyhow::bail!("token verification failed: {e}");
            }
        }
    }
    Ok(())
}

fn format_time(unix: u64) -> String {
    match i64::try_from(unix)
        .ok()
        .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
    {
        Some(t) => format!("{} ({unix})", t.to_rfc3339()),
        None => unix.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::output;
    use std::time::Duration;
    use tempfile::tempdir;
    use warrant_token::{Claims, KeyPair, Scope, TokenIssuer, unix_now};

    fn issue(keypair: &KeyPair, not_before: u64) -> String {
        let claims = Claims::new("AAECAwQFBgc", "client-1", not_before, Duration::from_secs(3600))
            .with_scope(Scope::admin());
        TokenIssuer::new(keypair.clone()).issue(&claims)
    }

    #[test]
    fn test_inspect_and_verify() {
        let keypair = KeyPair::generate();
        let token = issue(&keypair, unix_now());

        let mut buf = Vec::new();
        inspect(&token, Some(keypair.public_key()), &mut buf).unwrap();
        let printed = output(buf);
        assert!(printed.contains("Tenant ID:  AAECAwQFBgc"));
        assert!(printed.contains("Client ID:  client-1"));
        assert!(printed.contains("Scope:      admin"));
        assert!(printed.contains("Signature:  64 bytes"));
        assert!(printed.contains("✔ Token is valid"));
    }

    #[test]
    fn test_verify_rejects_wrong_key_and_expired() {
        let keypair = KeyPair::generate();
        let token = issue(&keypair, unix_now());
        let mut buf = Vec::new();
        assert!(inspect(&token, Some(KeyPair::generate().public_key()), &mut buf).is_err());
        assert!(output(buf).contains("✖ Token verification failed"));

        let expired = issue(&keypair, 1_000);
        let mut buf = Vec::new();
        inspect(&expired, None, &mut buf).unwrap();
        assert!(inspect(&expired, Some(keypair.public_key()), &mut Vec::new()).is_err());
    }

    #[test]
    fn test_resolve_from_files() {
        let dir = tempdir().unwrap();
        let keypair = KeyPair::generate();
        let token = issue(&keypair, unix_now());

        let token_path = dir.path().join("token.txt");
        fs::write(&token_path, format!("{token}\n")).unwrap();
        assert_eq!(resolve_token(token_path.to_str().unwrap()).unwrap(), token);
        assert_eq!(resolve_token(&token).unwrap(), token);

        let key_path = dir.path().join("public.key");
        fs::write(&key_path, keypair.public_key_hex()).unwrap();
        assert_eq!(
            resolve_public_key(key_path.to_str().unwrap()).unwrap(),
            keypair.public_key()
        );
        assert_eq!(
            resolve_public_key(&keypair.public_key_hex()).unwrap(),
            keypair.public_key()
        );
    }

    #[test]
    fn test_format_time_out_of_range() {
        assert_eq!(format_time(0), "1970-01-01T00:00:00+00:00 (0)");
        assert_eq!(format_time(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn test_inspect_garbage() {
        assert!(inspect("not a token", None, &mut Vec::new()).is_err());
    }
}
