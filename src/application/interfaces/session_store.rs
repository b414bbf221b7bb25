use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Session, SessionKey};

pub type SharedSession = Arc<Mutex<Session>>;

/// Looks up sessions by key, creating them on first use.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn session(&self, key: SessionKey) -> SharedSession;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
