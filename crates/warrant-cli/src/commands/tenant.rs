//! Tenant commands.
//!
//! `warrant tenant create` - Create a tenant.
//! `warrant tenant list` - List all tenants.
//! `warrant tenant get` - Look tenants up by id.

use std::io::Write;
use warrant_identity::IdentityStore;

pub async fn create(
    identity: &IdentityStore,
    description: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let tenant = identity.create_tenant(description).await?;

    writeln!(out, "✔ Tenant created:")?;
    writeln!(out, "  ID:          {}", tenant.id)?;
    writeln!(out, "  Description: {}", tenant.description)?;
    Ok(())
}

pub async fn list(identity: &IdentityStore, out: &mut impl Write) -> anyhow::Result<()> {
    for tenant in identity.list_tenants().await? {
        writeln!(out, "{}\t{}", tenant.id, tenant.description)?;
    }
    Ok(())
}

/// Print every tenant matching each id. A failed lookup is reported and
/// the remaining ids are still tried.
pub async fn get(
    identity: &IdentityStore,
    ids: &[String],
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for id in ids {
        match identity.get_tenant(id).await {
            Ok(matches) if matches.is_empty() => writeln!(out, "{id}:\tnot found")?,
            Ok(matches) => {
                for tenant in matches {
                    writeln!(out, "{}\t{}", tenant.id, tenant.description)?;
                }
            }
            Err(e) => writeln!(out, "{id}:\t{e}")?,
        }
    }
    Ok(())
}
