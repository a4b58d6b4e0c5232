//! Attachment byte storage
//!
//! `LocalBlobStore` keeps files under `<root>/<user_id>/<name>`; the
//! reference handed back is that relative path. `InMemoryBlobStore` is
//! used by tests and ephemeral deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use intake_bot_core::{BlobStore, CapabilityError, UserId};

use crate::{sanitize_component, PersistenceError};

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: &UserId) -> PathBuf {
        self.root.join(sanitize_component(user_id.as_str()))
    }

    fn reference(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }

    /// Resolve a reference, refusing anything outside the root
    fn resolve(&self, reference: &str) -> Result<PathBuf, PersistenceError> {
        let path = PathBuf::from(reference.trim());
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !path.starts_with(&self.root) {
            return Err(PersistenceError::InvalidReference(reference.to_string()));
        }
        Ok(path)
    }

    async fn write(
        &self,
        user_id: &UserId,
        bytes: &[u8],
        suggested_name: &str,
    ) -> Result<String, PersistenceError> {
        let dir = self.user_dir(user_id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(sanitize_component(suggested_name));
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(
            user_id = %user_id,
            path = %path.display(),
            size = bytes.len(),
            "Stored attachment"
        );
        Ok(Self::reference(&path))
    }

    async fn scan(&self, user_id: &UserId) -> Result<Vec<String>, PersistenceError> {
        let dir = self.user_dir(user_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut references = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                references.push(Self::reference(&entry.path()));
            }
        }
        references.sort();
        Ok(references)
    }

    async fn load(&self, reference: &str) -> Result<Vec<u8>, PersistenceError> {
        let path = self.resolve(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::NotFound(reference.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(
        &self,
        user_id: &UserId,
        bytes: &[u8],
        suggested_name: &str,
    ) -> Result<String, CapabilityError> {
        self.write(user_id, bytes, suggested_name)
            .await
            .map_err(|e| e.into_capability(CapabilityError::Blob))
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<String>, CapabilityError> {
        self.scan(user_id)
            .await
            .map_err(|e| e.into_capability(CapabilityError::Blob))
    }

    async fn read(&self, reference: &str) -> Result<Vec<u8>, CapabilityError> {
        self.load(reference)
            .await
            .map_err(|e| e.into_capability(CapabilityError::Blob))
    }
}

/// Blob store backed by a map of `<user_id>/<name>` to bytes
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&self, reference: &str) -> Option<Vec<u8>> {
        self.blobs.write().remove(reference)
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn store(
        &self,
        user_id: &UserId,
        bytes: &[u8],
        suggested_name: &str,
    ) -> Result<String, CapabilityError> {
        let reference = format!(
            "{}/{}",
            sanitize_component(user_id.as_str()),
            sanitize_component(suggested_name)
        );
        self.blobs.write().insert(reference.clone(), bytes.to_vec());
        Ok(reference)
    }

    async fn list(&self, user_id: &UserId) -> Result<Vec<String>, CapabilityError> {
        let prefix = format!("{}/", sanitize_component(user_id.as_str()));
        Ok(self
            .blobs
            .read()
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn read(&self, reference: &str) -> Result<Vec<u8>, CapabilityError> {
        self.blobs
            .read()
            .get(reference)
            .cloned()
            .ok_or_else(|| CapabilityError::NotFound(reference.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_store_list_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        let store = LocalBlobStore::new(&root);
        let user = UserId::from(42);

        assert!(store.list(&user).await.unwrap().is_empty());

        let b = store.store(&user, b"bbb", "b.pdf").await.unwrap();
        let a = store.store(&user, b"aaa", "photo_a.jpg").await.unwrap();
        // same name overwrites, no duplicate reference
        store.store(&user, b"aaa", "photo_a.jpg").await.unwrap();

        assert!(a.ends_with("42/photo_a.jpg"));
        assert_eq!(store.list(&user).await.unwrap(), vec![b.clone(), a.clone()]);
        assert_eq!(store.read(&a).await.unwrap(), b"aaa");

        let other = UserId::from(43);
        assert!(store.list(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_store_sanitizes_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let user = UserId::from(7);

        let reference = store.store(&user, b"x", "../../etc/passwd").await.unwrap();
        assert!(reference.starts_with(&LocalBlobStore::reference(dir.path())));
        assert!(!reference.contains(".."));
        assert_eq!(store.read(&reference).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_local_store_rejects_outside_references() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("uploads"));

        let err = store.read("/etc/hostname").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Blob(_)));

        let missing = format!(
            "{}/1/nothing.jpg",
            LocalBlobStore::reference(&dir.path().join("uploads"))
        );
        let err = store.read(&missing).await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryBlobStore::new();
        let user = UserId::from(1);
        let reference = store.store(&user, b"data", "photo_1.jpg").await.unwrap();
        store.store(&UserId::from(10), b"other", "x.jpg").await.unwrap();

        assert_eq!(reference, "1/photo_1.jpg");
        assert_eq!(store.list(&user).await.unwrap(), vec![reference.clone()]);
        assert_eq!(store.read(&reference).await.unwrap(), b"data");

        store.remove(&reference);
        assert_eq!(
            store.read(&reference).await.unwrap_err(),
            CapabilityError::NotFound(reference)
        );
    }
}
