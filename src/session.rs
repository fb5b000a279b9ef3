//! In-memory session store (non-persistent).
//!
//! Sessions are created lazily on first reference and live for the life of
//! the process. Appends to one session are serialized; distinct sessions
//! proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::llm::Message;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session key must not be empty")]
    EmptyKey,
}

/// One conversation. Message order is conversation order.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub key: String,
    pub created_at: String,
    pub messages: Vec<Message>,
}

impl Session {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            created_at: Utc::now().to_rfc3339(),
            messages: Vec::new(),
        }
    }

    /// History with synthetic continuation turns filtered out, suitable for
    /// showing to a human.
    pub fn transcript(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| !m.is_synthetic()).collect()
    }
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fetch a session handle, allocating an empty session on first use of
    /// the key.
    pub async fn get_or_create(&self, key: &str) -> Result<Arc<Mutex<Session>>, StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        if let Some(session) = self.sessions.read().await.get(key) {
            return Ok(Arc::clone(session));
        }

        // Another turn may have created the session between the locks.
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(key))));
        Ok(Arc::clone(session))
    }

    /// Append a message to a session's history.
    pub async fn append(&self, key: &str, message: Message) -> Result<(), StoreError> {
        let session = self.get_or_create(key).await?;
        session.lock().await.messages.push(message);
        Ok(())
    }

    /// Snapshot of a session's full history.
    pub async fn history(&self, key: &str) -> Result<Vec<Message>, StoreError> {
        let session = self.get_or_create(key).await?;
        let session = session.lock().await;
        Ok(session.messages.clone())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_sessions_lazily() {
        let store = SessionStore::new();

        store
            .append("campaign", Message::user("hello"))
            .await
            .expect("append");

        let history = store.history("campaign").await.expect("history");
        assert_eq!(history.len(), 1);

        let other = store.history("other").await.expect("history");
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn rejects_empty_key() {
        let store = SessionStore::new();

        let err = store.history("").await.expect_err("empty key");
        assert!(matches!(err, StoreError::EmptyKey));

        let err = store
            .append("", Message::user("hi"))
            .await
            .expect_err("empty key");
        assert!(matches!(err, StoreError::EmptyKey));
    }

    #[tokio::test]
    async fn preserves_append_order() {
        let store = SessionStore::new();

        store.append("s", Message::user("first")).await.expect("append");
        store
            .append("s", Message::assistant("second"))
            .await
            .expect("append");
        store.append("s", Message::user("third")).await.expect("append");

        let history = store.history("s").await.expect("history");
        assert_eq!(history.len(), 3);
        assert!(matches!(&history[0], Message::User { text, .. } if text == "first"));
        assert!(matches!(&history[1], Message::Assistant { text: Some(t), .. } if t == "second"));
        assert!(matches!(&history[2], Message::User { text, .. } if text == "third"));
    }

    #[tokio::test]
    async fn transcript_excludes_synthetic_turns() {
        let store = SessionStore::new();

        store.append("s", Message::user("real question")).await.expect("append");
        store
            .append(
                "s",
                Message::User {
                    text: "What should I do next?".to_string(),
                    synthetic: true,
                },
            )
            .await
            .expect("append");

        let session = store.get_or_create("s").await.expect("session");
        let session = session.lock().await;
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 1);
        assert!(matches!(transcript[0], Message::User { text, .. } if text == "real question"));
    }

    #[tokio::test]
    async fn distinct_sessions_append_concurrently() {
        let store = SessionStore::new();

        let a = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    store
                        .append("a", Message::user(format!("a{}", i)))
                        .await
                        .expect("append");
                }
            })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    store
                        .append("b", Message::user(format!("b{}", i)))
                        .await
                        .expect("append");
                }
            })
        };

        a.await.expect("task a");
        b.await.expect("task b");

        let history_a = store.history("a").await.expect("history");
        let history_b = store.history("b").await.expect("history");
        assert_eq!(history_a.len(), 50);
        assert_eq!(history_b.len(), 50);
        assert!(matches!(&history_a[49], Message::User { text, .. } if text == "a49"));
        assert!(matches!(&history_b[0], Message::User { text, .. } if text == "b0"));
    }
}
