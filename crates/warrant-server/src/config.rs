use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, fs, io, path::Path, path::PathBuf};
use warrant_identity::{CredentialScheme, KeyVersions, SecretVersion};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the tenant, client and asset collections.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/store")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Directory holding versioned secrets.
    #[serde(default = "default_secrets_path")]
    pub path: PathBuf,

    /// Pin the master secret to a version instead of the latest.
    #[serde(default)]
    pub master_secret_version: Option<u32>,

    /// Pin the signing key to a version instead of the latest.
    #[serde(default)]
    pub signing_key_version: Option<u32>,
}

fn default_secrets_path() -> PathBuf {
    PathBuf::from("data/secrets")
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            path: default_secrets_path(),
            master_secret_version: None,
            signing_key_version: None,
        }
    }
}

impl SecretsConfig {
    pub fn key_versions(&self) -> KeyVersions {
        KeyVersions {
            master_secret: SecretVersion::from(self.master_secret_version),
            signing_key: SecretVersion::from(self.signing_key_version),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Access token lifetime, e.g. "24h" or "90m".
    #[serde(default = "default_lifetime")]
    pub lifetime: String,
}

fn default_lifetime() -> String {
    humantime::format_duration(warrant_token::DEFAULT_TOKEN_LIFETIME).to_string()
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            lifetime: default_lifetime(),
        }
    }
}

impl TokenConfig {
    pub fn lifetime(&self) -> anyhow::Result<Duration> {
        let lifetime = humantime::parse_duration(&self.lifetime)
            .with_context(|| format!("invalid token lifetime {:?}", self.lifetime))?;
        anyhow::ensure!(
            lifetime.as_secs() > 0,
            "token lifetime must be at least one second"
        );
        Ok(lifetime)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub scheme: CredentialScheme,
}

/// Load configuration from `WARRANT_SERVER_CONFIG` (default `config.toml`).
///
/// A missing file yields the defaults. `WARRANT_BIND` overrides the bind
/// address.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let mut cfg = load_config_from(&config_path())?;
    if let Ok(bind) = env::var("WARRANT_BIND") {
        cfg.server.bind = bind;
    }
    Ok(cfg)
}

pub fn load_config_from(path: &Path) -> anyhow::Result<AppConfig> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let cfg: AppConfig =
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    cfg.token.lifetime()?;
    Ok(cfg)
}

fn config_path() -> PathBuf {
    if let Ok(p) = env::var("WARRANT_SERVER_CONFIG") {
        return PathBuf::from(p);
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.store.path, PathBuf::from("data/store"));
        assert_eq!(cfg.secrets.path, PathBuf::from("data/secrets"));
        assert_eq!(cfg.credentials.scheme, CredentialScheme::Derived);
        assert_eq!(cfg.token.lifetime().unwrap(), Duration::from_secs(86400));
        assert_eq!(cfg.secrets.key_versions(), KeyVersions::default());
    }

    #[test]
    fn test_parse_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
bind = "127.0.0.1:9000"

[secrets]
path = "/var/lib/warrant/secrets"
signing_key_version = 3

[token]
lifetime = "90m"

[credentials]
scheme = "hashed"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:9000");
        assert_eq!(cfg.store.path, PathBuf::from("data/store"));
        assert_eq!(cfg.token.lifetime().unwrap(), Duration::from_secs(90 * 60));
        assert_eq!(cfg.credentials.scheme, CredentialScheme::Hashed);

        let versions = cfg.secrets.key_versions();
        assert_eq!(versions.master_secret, SecretVersion::Latest);
        assert_eq!(versions.signing_key, SecretVersion::Version(3));
    }

    #[test]
    fn test_rejects_bad_lifetime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[token]\nlifetime = \"soon\"\n").unwrap();
        assert!(load_config_from(&path).is_err());

        fs::write(&path, "[token]\nlifetime = \"0s\"\n").unwrap();
        assert!(load_config_from(&path).is_err());
    }
}
