//! Document store backends.

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// A stored record: string field names to string values.
pub type Document = BTreeMap<String, String>;

/// Collection holding tenant records.
pub const TENANTS: &str = "tenants";

/// Collection holding client records.
pub const CLIENTS: &str = "clients";

/// Collection holding published assets (e.g. the token public key).
pub const ASSETS: &str = "assets";

/// Trait for document store backends.
///
/// Collections are append-only; there is no update or delete.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Append a document to a collection.
    async fn add(&self, collection: &str, doc: Document) -> Result<(), StoreError>;

    /// All documents whose `field` equals `value`, in insertion order.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let docs = self.list(collection).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| doc.get(field).map(String::as_str) == Some(value))
            .collect())
    }

    /// All documents in a collection, in insertion order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
}

/// In-memory store (tests and embedding).
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire write lock: {}", e)))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire read lock: {}", e)))?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }
}

/// Directory-backed store: one JSON Lines file per collection.
pub struct FileDocumentStore {
    root: PathBuf,
    // Serializes appends from this process.
    write_lock: Mutex<()>,
}

impl FileDocumentStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            StoreError::Unavailable(format!("cannot create {}: {e}", root.display()))
        })?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Unavailable(format!(
                "invalid collection name {collection:?}"
            )));
        }
        Ok(self.root.join(format!("{collection}.jsonl")))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn add(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        let path = self.collection_path(collection)?;
        let mut line =
            serde_json::to_string(&doc).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;

        tracing::debug!(collection, path = %path.display(), "document appended");
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let path = self.collection_path(collection)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Unavailable(format!("{}: {e}", path.display())));
            }
        };

        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    StoreError::Corrupt(format!("{} line {}: {e}", path.display(), n + 1))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, description: &str) -> Document {
        Document::from([
            ("id".to_string(), id.to_string()),
            ("description".to_string(), description.to_string()),
        ])
    }

    #[tokio::test]
    async fn test_memory_store_query() {
        let store = MemoryDocumentStore::new();
        store.add(TENANTS, doc("a", "first")).await.unwrap();
        store.add(TENANTS, doc("b", "second")).await.unwrap();
        store.add(TENANTS, doc("a", "duplicate")).await.unwrap();

        assert_eq!(store.list(TENANTS).await.unwrap().len(), 3);
        assert!(store.list(CLIENTS).await.unwrap().is_empty());

        let matches = store.query_eq(TENANTS, "id", "a").await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1]["description"], "duplicate");
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileDocumentStore::open(dir.path()).await.unwrap();
            store.add(CLIENTS, doc("c1", "runner")).await.unwrap();
            store.add(CLIENTS, doc("c2", "deployer")).await.unwrap();
        }

        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        let docs = store.list(CLIENTS).await.unwrap();
        assert_eq!(docs, vec![doc("c1", "runner"), doc("c2", "deployer")]);
        assert_eq!(store.query_eq(CLIENTS, "id", "c2").await.unwrap().len(), 1);
        assert!(store.list(ASSETS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_rejects_bad_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        assert!(store.add("../escape", doc("x", "y")).await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tenants.jsonl"), "{not json}\n").unwrap();
        let store = FileDocumentStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.list(TENANTS).await,
            Err(StoreError::Corrupt(_))
        ));
    }
}
