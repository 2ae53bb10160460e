//! Session Store: keyed map of live sessions with per-key exclusion.
//!
//! The map lock is only held to look up, insert or remove a slot. All work on
//! a single session happens under that session's own locks, so sessions
//! never contend with each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use standoff_core::error::GameError;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use crate::domain::aggregates::GameSession;

/// One stored session plus its exclusion primitives.
#[derive(Debug)]
pub struct SessionSlot {
    state: Mutex<GameSession>,
    decision_gate: Mutex<()>,
    retired: AtomicBool,
}

impl SessionSlot {
    fn new(session: GameSession) -> Self {
        Self {
            state: Mutex::new(session),
            decision_gate: Mutex::new(()),
            retired: AtomicBool::new(false),
        }
    }

    /// Locks the session state. Never hold this across a decision call.
    pub async fn state(&self) -> MutexGuard<'_, GameSession> {
        self.state.lock().await
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> GameSession {
        self.state.lock().await.clone()
    }

    /// Waits for the right to consult the decision process for this session.
    ///
    /// Tokio's mutex is fair, so waiters are admitted in arrival order.
    pub async fn decision_gate(&self) -> MutexGuard<'_, ()> {
        self.decision_gate.lock().await
    }

    /// Marks the slot as replaced or ended. Results that arrive afterwards
    /// are discarded.
    ///
    /// Takes the state lock, so an apply already holding it finishes first
    /// and every later apply sees the flag.
    pub async fn retire(&self) {
        let _state = self.state.lock().await;
        self.retired.store(true, Ordering::SeqCst);
    }

    /// Whether the slot has been retired.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }
}

/// In-memory store of every live session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SessionSlot>>>,
    generations: AtomicU64,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a generation tag strictly larger than every tag handed out
    /// before.
    pub fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Adds a session under its id.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Infrastructure` if the id is already in use.
    pub async fn insert(&self, session: GameSession) -> Result<Arc<SessionSlot>, GameError> {
        let id = session.id();
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(GameError::Infrastructure(format!(
                "session id collision: {id}"
            )));
        }
        let slot = Arc::new(SessionSlot::new(session));
        sessions.insert(id, Arc::clone(&slot));
        Ok(slot)
    }

    /// Looks up a session.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownSession` if no session has this id.
    pub async fn get(&self, session_id: Uuid) -> Result<Arc<SessionSlot>, GameError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(GameError::UnknownSession(session_id))
    }

    /// Removes a session, returning its slot if it existed.
    pub async fn remove(&self, session_id: Uuid) -> Option<Arc<SessionSlot>> {
        self.sessions.write().await.remove(&session_id)
    }

    /// Ids of every stored session.
    pub async fn ids(&self) -> Vec<Uuid> {
        self.sessions.read().await.keys().copied().collect()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
