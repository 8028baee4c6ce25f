use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::AbortHandle;

use crate::types::StreamChunk;

/// One registration's outbound channel and abort flag
///
/// A turn holds the handle of the connection it started on, so its chunks
/// never reach a socket that later registers under the same client id.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    connection_id: u64,
    sender: mpsc::Sender<StreamChunk>,
    abort: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Returns false once the socket writer has gone away
    pub async fn send(&self, chunk: StreamChunk) -> bool {
        self.sender.send(chunk).await.is_ok()
    }

    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    pub fn clear_abort(&self) {
        self.abort.store(false, Ordering::SeqCst);
    }
}

struct SessionEntry {
    session: SessionHandle,
    worker: Option<AbortHandle>,
}

/// Live client sessions keyed by client id
///
/// Each session owns the sending half of its socket writer's channel and a
/// cancellation flag. The flag is the only state the abort path shares with a
/// streaming turn.
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    next_connection_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Register a session with a fresh, unset abort flag
    ///
    /// Replaces any existing session under the same id and cancels the turn
    /// worker attached to it.
    pub async fn register(&self, client_id: &str, sender: mpsc::Sender<StreamChunk>) -> SessionHandle {
        let session = SessionHandle {
            connection_id: self.next_connection_id.fetch_add(1, Ordering::Relaxed),
            sender,
            abort: Arc::new(AtomicBool::new(false)),
        };
        let connection_id = session.connection_id;

        let mut sessions = self.sessions.write().await;
        let previous = sessions.insert(
            client_id.to_string(),
            SessionEntry {
                session: session.clone(),
                worker: None,
            },
        );

        match previous {
            Some(previous) => {
                if let Some(worker) = previous.worker {
                    worker.abort();
                }
                tracing::warn!(
                    client_id,
                    connection_id,
                    superseded = previous.session.connection_id,
                    "Session replaced by a newer connection"
                );
            }
            None => tracing::info!(client_id, connection_id, "Session registered"),
        }
        session
    }

    /// Tie a turn worker to a registration so a replacement can cancel it
    ///
    /// A worker for a registration that is already superseded is cancelled
    /// immediately and `false` is returned.
    pub async fn attach_worker(&self, client_id: &str, connection_id: u64, worker: AbortHandle) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(client_id) {
            Some(entry) if entry.session.connection_id == connection_id => {
                entry.worker = Some(worker);
                true
            }
            _ => {
                worker.abort();
                false
            }
        }
    }

    /// Handle of the current registration for `client_id`
    pub async fn session(&self, client_id: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(client_id)
            .map(|entry| entry.session.clone())
    }

    /// Remove a session unconditionally; returns whether one existed
    pub async fn unregister(&self, client_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(client_id).is_some();
        if removed {
            tracing::info!(client_id, "Session unregistered");
        }
        removed
    }

    /// Remove the session only if it is still the given registration
    pub async fn unregister_connection(&self, client_id: &str, connection_id: u64) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(client_id) {
            Some(entry) if entry.session.connection_id == connection_id => {
                sessions.remove(client_id);
                tracing::info!(client_id, connection_id, "Session unregistered");
                true
            }
            Some(_) => {
                tracing::debug!(client_id, connection_id, "Session already owned by a newer connection");
                false
            }
            None => false,
        }
    }

    /// Deliver a chunk to the current session; a missing or closed session is not an error
    pub async fn send(&self, client_id: &str, chunk: StreamChunk) {
        let Some(session) = self.session(client_id).await else {
            tracing::debug!(client_id, "Dropping chunk for unknown session");
            return;
        };

        if !session.send(chunk).await {
            tracing::debug!(client_id, "Dropping chunk for closed session");
        }
    }

    /// Set the session's abort flag; returns false for unknown sessions
    pub async fn request_abort(&self, client_id: &str) -> bool {
        match self.sessions.read().await.get(client_id) {
            Some(entry) => {
                entry.session.request_abort();
                tracing::info!(client_id, "Abort requested");
                true
            }
            None => false,
        }
    }

    pub async fn is_aborted(&self, client_id: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(client_id)
            .is_some_and(|entry| entry.session.is_aborted())
    }

    pub async fn clear_abort(&self, client_id: &str) {
        if let Some(entry) = self.sessions.read().await.get(client_id) {
            entry.session.clear_abort();
        }
    }

    pub async fn contains(&self, client_id: &str) -> bool {
        self.sessions.read().await.contains_key(client_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
