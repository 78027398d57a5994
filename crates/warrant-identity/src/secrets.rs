//! Secret-management backends.

use crate::error::SecretError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Which version of a secret to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecretVersion {
    #[default]
    Latest,
    Version(u32),
}

impl From<Option<u32>> for SecretVersion {
    fn from(version: Option<u32>) -> Self {
        version.map_or(SecretVersion::Latest, SecretVersion::Version)
    }
}

impl fmt::Display for SecretVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretVersion::Latest => f.write_str("latest"),
            SecretVersion::Version(n) => write!(f, "{n}"),
        }
    }
}

/// Trait for secret-management backends.
///
/// Versions are numbered from 1. Creating a secret adds a version; older
/// versions stay readable.
#[async_trait]
pub trait SecretManager: Send + Sync {
    async fn get(&self, name: &str, version: SecretVersion) -> Result<Vec<u8>, SecretError>;

    /// Store `data` as the next version of `name`, returning its number.
    async fn create(&self, name: &str, data: &[u8]) -> Result<u32, SecretError>;
}

fn validate_name(name: &str) -> Result<(), SecretError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SecretError::InvalidName(name.to_string()))
    }
}

fn not_found(name: &str, version: SecretVersion) -> SecretError {
    SecretError::NotFound {
        name: name.to_string(),
        version: version.to_string(),
    }
}

/// In-memory secret manager (tests and embedding).
#[derive(Default)]
pub struct MemorySecretManager {
    secrets: RwLock<HashMap<String, Vec<Vec<u8>>>>,
}

impl MemorySecretManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretManager for MemorySecretManager {
    async fn get(&self, name: &str, version: SecretVersion) -> Result<Vec<u8>, SecretError> {
        validate_name(name)?;
        let secrets = self
            .secrets
            .read()
            .map_err(|e| SecretError::Unavailable(format!("Failed to acquire read lock: {}", e)))?;
        let versions = secrets.get(name).ok_or_else(|| not_found(name, version))?;
        let data = match version {
            SecretVersion::Latest => versions.last(),
            SecretVersion::Version(n) => n
                .checked_sub(1)
                .and_then(|i| versions.get(i as usize)),
        };
        data.cloned().ok_or_else(|| not_found(name, version))
    }

    async fn create(&self, name: &str, data: &[u8]) -> Result<u32, SecretError> {
        validate_name(name)?;
        let mut secrets = self
            .secrets
            .write()
            .map_err(|e| SecretError::Unavailable(format!("Failed to acquire write lock: {}", e)))?;
        let versions = secrets.entry(name.to_string()).or_default();
        versions.push(data.to_vec());
        Ok(versions.len() as u32)
    }
}

/// Directory-backed secret manager: `<root>/<name>/<version>`.
pub struct FileSecretManager {
    root: PathBuf,
    // Serializes version allocation from this process. Other processes are
    // caught by the exclusive create.
    create_lock: Mutex<()>,
}

impl FileSecretManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            create_lock: Mutex::new(()),
        }
    }

    async fn versions(&self, dir: &Path) -> Result<Vec<u32>, SecretError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(unavailable(dir, e)),
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| unavailable(dir, e))? {
            if let Some(n) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) {
                versions.push(n);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }
}

/// Create `path` and write `data`, failing if it already exists.
///
/// On unix the file is created with mode 0600.
async fn write_new(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

fn unavailable(path: &Path, err: std::io::Error) -> SecretError {
    SecretError::Unavailable(format!("{}: {err}", path.display()))
}

#[async_trait]
impl SecretManager for FileSecretManager {
    async fn get(&self, name: &str, version: SecretVersion) -> Result<Vec<u8>, SecretError> {
        validate_name(name)?;
        let dir = self.root.join(name);
        let n = match version {
            SecretVersion::Version(n) => n,
            SecretVersion::Latest => *self
                .versions(&dir)
                .await?
                .last()
                .ok_or_else(|| not_found(name, version))?,
        };

        let path = dir.join(n.to_string());
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found(name, version)),
            Err(e) => Err(unavailable(&path, e)),
        }
    }

    async fn create(&self, name: &str, data: &[u8]) -> Result<u32, SecretError> {
        validate_name(name)?;
        let dir = self.root.join(name);

        let _guard = self.create_lock.lock().await;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| unavailable(&dir, e))?;
        let next = self.versions(&dir).await?.last().map_or(1, |n| n + 1);
        let path = dir.join(next.to_string());

        match write_new(&path, data).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(SecretError::VersionConflict {
                    name: name.to_string(),
                    version: next,
                });
            }
            Err(e) => return Err(unavailable(&path, e)),
        }

        tracing::info!(secret = name, version = next, "secret version created");
        Ok(next)
    }
}
