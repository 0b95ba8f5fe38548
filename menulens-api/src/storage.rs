//! Object store collaborator
//!
//! Content-addressed, unversioned byte storage behind a trait so tests can
//! substitute an in-memory implementation. The production implementation is
//! filesystem-backed, rooted in the data directory, constructed once at
//! startup and injected wherever storage is needed.

use async_trait::async_trait;
use menulens_common::{Error, Result};
use std::path::{Path, PathBuf};

/// A stored blob with its content type
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object store interface: `exists`, `get`, `put`.
///
/// `get` distinguishes a miss (`Ok(None)`) from an I/O failure. `put` is a
/// wholesale overwrite; concurrent writers race with last-write-wins.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn get(&self, key: &str) -> Result<Option<StoredObject>>;
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
}

/// Filesystem-backed object store.
///
/// Keys map to paths under the root; the content type is persisted in a
/// `.ctype` sidecar next to each object.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        // Keys are service-generated ("{run_id}/menu.json") but reject
        // traversal anyway since upload keys pass through client requests.
        if key.is_empty() || key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(Error::InvalidInput(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(key))
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        let mut os = path.as_os_str().to_owned();
        os.push(".ctype");
        PathBuf::from(os)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        let path = self.object_path(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let content_type = match tokio::fs::read_to_string(Self::sidecar_path(&path)).await {
            Ok(ct) => ct,
            Err(_) => "application/octet-stream".to_string(),
        };

        Ok(Some(StoredObject { bytes, content_type }))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        tokio::fs::write(Self::sidecar_path(&path), content_type).await?;
        Ok(())
    }
}
