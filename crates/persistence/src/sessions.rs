//! Session stores
//!
//! - `InMemorySessionStore`: default, lost on restart
//! - `FileSessionStore`: one JSON document per user, written atomically

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use intake_bot_core::{CapabilityError, Session, SessionStore, UserId};

use crate::{sanitize_component, PersistenceError};

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<Session>, CapabilityError> {
        Ok(self.sessions.read().get(user_id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), CapabilityError> {
        self.sessions
            .write()
            .insert(session.user_id.clone(), session.clone());
        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), CapabilityError> {
        self.sessions.write().remove(user_id);
        Ok(())
    }
}

/// JSON-file session store (`<dir>/<user_id>.json`)
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user_id: &UserId) -> PathBuf {
        self.dir
            .join(format!("{}.json", sanitize_component(user_id.as_str())))
    }

    async fn read(&self, user_id: &UserId) -> Result<Option<Session>, PersistenceError> {
        let path = self.path_for(user_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, session: &Session) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&session.user_id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, user_id: &UserId) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(self.path_for(user_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<Session>, CapabilityError> {
        self.read(user_id)
            .await
            .map_err(|e| e.into_capability(CapabilityError::Session))
    }

    async fn save(&self, session: &Session) -> Result<(), CapabilityError> {
        self.write(session).await.map_err(|e| {
            tracing::error!(user_id = %session.user_id, error = %e, "Failed to persist session");
            e.into_capability(CapabilityError::Session)
        })
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), CapabilityError> {
        self.remove(user_id)
            .await
            .map_err(|e| e.into_capability(CapabilityError::Session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_bot_core::{DialogueState, Field};

    fn sample_session() -> Session {
        let mut session = Session::new(UserId::from(1001));
        session.enter(DialogueState::AwaitingItemDetails);
        session.record(Field::Name, "Ivan").unwrap();
        session.append_comment("granite");
        session.add_file("uploads/1001/photo_x.jpg");
        session
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySessionStore::new();
        let session = sample_session();
        assert!(store.load(&session.user_id).await.unwrap().is_none());

        store.save(&session).await.unwrap();
        assert_eq!(store.load(&session.user_id).await.unwrap(), Some(session.clone()));
        assert_eq!(store.len(), 1);

        store.clear(&session.user_id).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions"));
        let session = sample_session();

        assert!(store.load(&session.user_id).await.unwrap().is_none());
        store.save(&session).await.unwrap();

        let reopened = FileSessionStore::new(dir.path().join("sessions"));
        assert_eq!(
            reopened.load(&session.user_id).await.unwrap(),
            Some(session.clone())
        );

        reopened.clear(&session.user_id).await.unwrap();
        assert!(reopened.load(&session.user_id).await.unwrap().is_none());
        // clearing twice is fine
        reopened.clear(&session.user_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        let user = UserId::from(5);
        std::fs::write(dir.path().join("5.json"), b"{not json").unwrap();

        let err = store.load(&user).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Session(_)));
    }
}
