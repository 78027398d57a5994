//! Client commands.
//!
//! `warrant client create` - Create a client under a tenant and print its secret.
//! `warrant client list` - List all clients.
//! `warrant client get` - Look clients up by id, optionally checking a secret.

use std::io::Write;
use warrant_identity::{Client, IdentityStore};

/// Create a client. The plaintext secret is printed here and nowhere else.
pub async fn create(
    identity: &IdentityStore,
    tenant_id: &str,
    description: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let client = identity.create_client(tenant_id, description).await?;
    let secret = client.plain_secret.as_deref().unwrap_or_default();

    writeln!(out, "✔ Client created:")?;
    write_client(&client, out)?;
    writeln!(out, "  Secret:      {secret}")?;
    writeln!(out)?;
    writeln!(out, "⚠️  The secret is shown only once. Store it securely.")?;
    writeln!(out)?;
    writeln!(out, "Token request body:")?;
    writeln!(out, "  {}", token_request_body(&client.id, secret))?;
    Ok(())
}

pub async fn list(identity: &IdentityStore, out: &mut impl Write) -> anyhow::Result<()> {
    for client in identity.list_clients().await? {
        writeln!(out, "{}\t{}\t{}", client.id, client.tenant_id, client.description)?;
    }
    Ok(())
}

pub async fn get(
    identity: &IdentityStore,
    ids: &[String],
    secret: Option<&str>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for id in ids {
        let matches = match identity.get_client(id).await {
            Ok(matches) => matches,
            Err(e) => {
                writeln!(out, "{id}:\t{e}")?;
                continue;
            }
        };
        if matches.is_empty() {
            writeln!(out, "{id}:\tnot found")?;
        }
        for client in matches {
            write_client(&client, out)?;
            if let Some(secret) = secret {
                let ok = identity
                    .verifier()
                    .verify(&client.id, secret, client.secret_hash.as_deref());
                if ok {
                    writeln!(out, "  Secret:      ✓")?;
                } else {
                    writeln!(out, "  Secret:      ✗ does not match")?;
                }
            }
        }
    }
    Ok(())
}

fn write_client(client: &Client, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "  ID:          {}", client.id)?;
    writeln!(out, "  Tenant ID:   {}", client.tenant_id)?;
    writeln!(out, "  Description: {}", client.description)
}

/// `application/x-www-form-urlencoded` body for a `client_credentials` request.
pub fn token_request_body(client_id: &str, client_secret: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "client_credentials")
        .append_pair("client_id", client_id)
        .append_pair("client_secret", client_secret)
        .finish()
}
