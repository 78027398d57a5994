mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::Context;
use commands::key::KeyName;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use warrant_identity::{CredentialScheme, SecretVersion};

#[derive(Parser, Debug)]
#[command(name = "warrant", version, about = "Warrant administration CLI")]
struct Cli {
    /// Document store directory (tenants, clients, published keys)
    #[arg(long, env = "WARRANT_STORE", default_value = "data/store", global = true)]
    store: PathBuf,

    /// Secret directory (master secret, signing key)
    #[arg(long, env = "WARRANT_SECRETS", default_value = "data/secrets", global = true)]
    secrets: PathBuf,

    /// Credential scheme; must match the server's `[credentials] scheme`
    #[arg(long, env = "WARRANT_CREDENTIAL_SCHEME", value_enum, default_value_t = Scheme::Derived, global = true)]
    scheme: Scheme,

    /// Master secret version to derive client secrets from (default: latest);
    /// must match the server's `[secrets] master_secret_version`
    #[arg(long, env = "WARRANT_MASTER_SECRET_VERSION", global = true)]
    master_secret_version: Option<u32>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scheme {
    Derived,
    Hashed,
}

impl From<Scheme> for CredentialScheme {
    fn from(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Derived => CredentialScheme::Derived,
            Scheme::Hashed => CredentialScheme::Hashed,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tenant management (create/list/get)
    Tenant {
        #[command(subcommand)]
        cmd: TenantCommand,
    },

    /// Client management (create/list/get)
    Client {
        #[command(subcommand)]
        cmd: ClientCommand,
    },

    /// Master secret and signing key management
    Key {
        #[command(subcommand)]
        cmd: KeyCommand,
    },

    /// Token inspection
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TenantCommand {
    /// Create a tenant
    Create { description: String },

    /// List all tenants
    List,

    /// Show tenants by id
    Get {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    /// Create a client and print its secret
    Create {
        /// Tenant the client belongs to
        #[arg(long)]
        tenant: String,

        description: String,
    },

    /// List all clients
    List,

    /// Show clients by id
    Get {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Check this secret against each client
        #[arg(long)]
        secret: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum KeyCommand {
    /// Create a new version of each named key
    Create {
        #[arg(required = true, value_enum)]
        names: Vec<KeyName>,
    },

    /// Show stored key material
    Get {
        #[arg(required = true, value_enum)]
        names: Vec<KeyName>,

        /// Secret version (default: latest)
        #[arg(long)]
        version: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Decode a token (inline or a path to a file holding it)
    Inspect {
        token: String,

        /// Verify the signature and validity window
        #[arg(long, default_value_t = false)]
        verify: bool,

        /// Public key (hex or file) to verify with; defaults to the published key
        #[arg(long, env = "WARRANT_PUBLIC_KEY")]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context {
        store: cli.store,
        secrets: cli.secrets,
        scheme: cli.scheme.into(),
        master_secret_version: SecretVersion::from(cli.master_secret_version),
    };
    let mut out = io::stdout().lock();

    match cli.cmd {
        Command::Tenant { cmd } => {
            let identity = ctx.identity().await?;
            match cmd {
                TenantCommand::Create { description } => {
                    commands::tenant::create(&identity, &description, &mut out).await?
                }
                TenantCommand::List => commands::tenant::list(&identity, &mut out).await?,
                TenantCommand::Get { ids } => {
                    commands::tenant::get(&identity, &ids, &mut out).await?
                }
            }
        }

        Command::Client { cmd } => {
            let identity = ctx.identity().await?;
            match cmd {
                ClientCommand::Create {
                    tenant,
                    description,
                } => commands::client::create(&identity, &tenant, &description, &mut out).await?,
                ClientCommand::List => commands::client::list(&identity, &mut out).await?,
                ClientCommand::Get { ids, secret } => {
                    commands::client::get(&identity, &ids, secret.as_deref(), &mut out).await?
                }
            }
        }

        Command::Key { cmd } => {
            let lifecycle = ctx.lifecycle().await?;
            match cmd {
                KeyCommand::Create { names } => {
                    commands::key::create(&lifecycle, &names, &mut out).await?
                }
                KeyCommand::Get { names, version } => {
                    commands::key::get(&lifecycle, &names, SecretVersion::from(version), &mut out)
                        .await?
                }
            }
        }

        Command::Token { cmd } => match cmd {
            TokenCommand::Inspect { token, verify, key } => {
                let token = commands::token::resolve_token(&token)?;
                let public_key = match (verify, key) {
                    (false, _) => None,
                    (true, Some(key)) => Some(commands::token::resolve_public_key(&key)?),
                    (true, None) => Some(
                        ctx.lifecycle()
                            .await?
                            .published_public_key()
                            .await?
                            .ok_or_else(|| {
                                anyhow::anyhow!(
                                    "No published public key. Pass --key or run `warrant key create token-signature-key`"
                                )
                            })?,
                    ),
                };
                commands::token::inspect(&token, public_key, &mut out)?
            }
        },
    }

    Ok(())
}
