use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{SessionStore, SharedSession};
use crate::domain::{Session, SessionKey};

/// Keeps every session in memory for the lifetime of the process.
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionKey, SharedSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn session(&self, key: SessionKey) -> SharedSession {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(key).or_insert_with(|| {
            debug!("Creating session for user {}", key);
            Arc::new(Mutex::new(Session::new(key)))
        });
        Arc::clone(session)
    }

    async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
