//! Key management commands.
//!
//! `warrant key create` - Create new versions of the master secret or signing key.
//! `warrant key get` - Show stored key material.

use clap::ValueEnum;
use std::io::Write;
use warrant_identity::KeyLifecycle;
use warrant_identity::SecretVersion;
use warrant_identity::lifecycle::{CLIENT_ID_SECRET, TOKEN_SIGNATURE_KEY};

/// Well-known keys managed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyName {
    /// Master secret client secrets are derived from
    ClientIdSecret,
    /// Ed25519 token signing keypair
    TokenSignatureKey,
}

impl KeyName {
    pub fn secret_name(self) -> &'static str {
        match self {
            KeyName::ClientIdSecret => CLIENT_ID_SECRET,
            KeyName::TokenSignatureKey => TOKEN_SIGNATURE_KEY,
        }
    }
}

pub async fn create(
    lifecycle: &KeyLifecycle,
    names: &[KeyName],
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for name in names {
        match name {
            KeyName::ClientIdSecret => {
                let version = lifecycle.create_master_secret().await?;
                writeln!(out, "✔ Created {} version {version}", name.secret_name())?;
                writeln!(
                    out,
                    "⚠️  Secrets of existing clients change once the server loads this version."
                )?;
            }
            KeyName::TokenSignatureKey => {
                let (version, public_key) = lifecycle.create_signing_keypair().await?;
                writeln!(out, "✔ Created {} version {version}", name.secret_name())?;
                writeln!(out, "  Public key: {}", hex::encode(public_key.as_bytes()))?;
            }
        }
    }
    Ok(())
}

/// Show key material. The signing key is shown by its public half only:
/// the published one by default, or the one derived from the requested
/// stored version.
pub async fn get(
    lifecycle: &KeyLifecycle,
    names: &[KeyName],
    version: SecretVersion,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for name in names {
        match name {
            KeyName::ClientIdSecret => {
                let data = lifecycle.get(name.secret_name(), version).await?;
                writeln!(out, "{} ({version}, {} bytes):", name.secret_name(), data.len())?;
                write!(out, "{}", hex_dump(&data))?;
            }
            KeyName::TokenSignatureKey => {
                let public_key = match version {
                    SecretVersion::Latest => lifecycle.published_public_key().await?,
                    SecretVersion::Version(_) => {
                        Some(lifecycle.signing_public_key(version).await?)
                    }
                };
                match public_key {
                    Some(public_key) => writeln!(
                        out,
                        "{} ({version}) public key: {}",
                        name.secret_name(),
                        hex::encode(public_key.as_bytes())
                    )?,
                    None => writeln!(out, "{}: no public key published", name.secret_name())?,
                }
            }
        }
    }
    Ok(())
}

/// Offset, hex bytes, 16 per line.
fn hex_dump(data: &[u8]) -> String {
    let mut dump = String::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let bytes: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        dump.push_str(&format!("{:08x}  {}\n", i * 16, bytes.join(" ")));
    }
    dump
}
