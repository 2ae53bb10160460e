//! Per-session workers and session to connection links.

use std::collections::HashMap;
use std::sync::Arc;

use standoff_core::clock::Clock;
use standoff_core::decision::DecisionAdapter;
use standoff_core::error::GameError;
use standoff_core::input::PlayerInput;
use standoff_protocol::{RecordingStatus, ServerMessage};
use standoff_session::application::settings::SessionSettings;
use standoff_session::application::store::SessionStore;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::worker;

/// Queue of frames bound for one client, in send order.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Pending reply to an action handed to a session worker.
pub type Reply<T> = oneshot::Receiver<Result<T, GameError>>;

/// Result of an applied input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputApplied {
    pub session_id: Uuid,
    pub generation: u64,
    /// Narrative frames published to the linked connection.
    pub events: usize,
    /// Whether the input ended the session.
    pub ended: bool,
}

/// Where a worker reports the outcome of an input.
#[derive(Debug)]
pub(crate) enum InputReply {
    /// The connection that sent the input. A failure is queued on it as an
    /// error frame before the worker takes its next job.
    Connection(Outbound),
    /// A caller awaiting the outcome.
    Caller(oneshot::Sender<Result<InputApplied, GameError>>),
}

/// One unit of work for a session worker.
#[derive(Debug)]
pub(crate) enum Job {
    Input {
        correlation_id: Uuid,
        input: PlayerInput,
        reply: InputReply,
    },
    /// Recording actions only arrive over a connection; the acknowledgement
    /// or error goes back on `outbound`.
    Recording {
        correlation_id: Uuid,
        status: RecordingStatus,
        outbound: Outbound,
    },
}

#[derive(Debug)]
struct Link {
    connection_id: Uuid,
    outbound: Outbound,
}

pub(crate) struct HubInner {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) adapter: Arc<dyn DecisionAdapter>,
    pub(crate) settings: Arc<SessionSettings>,
    pub(crate) workers: Mutex<HashMap<Uuid, mpsc::UnboundedSender<Job>>>,
    links: Mutex<HashMap<Uuid, Link>>,
}

/// Runs one worker task per active session and remembers which connection
/// each session's events go to.
#[derive(Clone)]
pub struct SessionHub {
    pub(crate) inner: Arc<HubInner>,
}

impl SessionHub {
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        store: Arc<SessionStore>,
        adapter: Arc<dyn DecisionAdapter>,
        settings: Arc<SessionSettings>,
    ) -> Self {
        Self {
            inner: Arc::new(HubInner {
                clock,
                store,
                adapter,
                settings,
                workers: Mutex::new(HashMap::new()),
                links: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Queues an input for the session's worker and returns a handle to its
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownSession` if the session does not exist.
    /// Returns `GameError::InvalidTransition` if the session has ended.
    pub async fn submit_input(
        &self,
        session_id: Uuid,
        correlation_id: Uuid,
        input: PlayerInput,
    ) -> Result<Reply<InputApplied>, GameError> {
        let (reply, receiver) = oneshot::channel();
        self.enqueue(
            session_id,
            Job::Input {
                correlation_id,
                input,
                reply: InputReply::Caller(reply),
            },
        )
        .await?;
        Ok(receiver)
    }

    /// Queues an input sent over a connection. A failure is reported on
    /// `outbound`, in order with the session's narrative frames.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownSession` if the session does not exist.
    /// Returns `GameError::InvalidTransition` if the session has ended.
    pub async fn submit_input_from(
        &self,
        session_id: Uuid,
        correlation_id: Uuid,
        input: PlayerInput,
        outbound: Outbound,
    ) -> Result<(), GameError> {
        self.enqueue(
            session_id,
            Job::Input {
                correlation_id,
                input,
                reply: InputReply::Connection(outbound),
            },
        )
        .await
    }

    /// Queues a recording start or stop for the session's worker. The
    /// acknowledgement or error is sent on `outbound`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownSession` if the session does not exist.
    pub async fn record(
        &self,
        session_id: Uuid,
        correlation_id: Uuid,
        status: RecordingStatus,
        outbound: Outbound,
    ) -> Result<(), GameError> {
        self.enqueue(
            session_id,
            Job::Recording {
                correlation_id,
                status,
                outbound,
            },
        )
        .await
    }

    async fn enqueue(&self, session_id: Uuid, job: Job) -> Result<(), GameError> {
        let slot = self.inner.store.get(session_id).await?;
        if matches!(job, Job::Input { .. }) {
            slot.snapshot().await.ensure_accepts_input()?;
        }

        let mut workers = self.inner.workers.lock().await;
        let inbox = workers
            .entry(session_id)
            .or_insert_with(|| self.spawn_worker(session_id));
        if let Err(mpsc::error::SendError(job)) = inbox.send(job) {
            warn!(%session_id, "session worker had stopped; starting a new one");
            let fresh = self.spawn_worker(session_id);
            fresh.send(job).map_err(|_| {
                GameError::Infrastructure(format!("no worker for session {session_id}"))
            })?;
            workers.insert(session_id, fresh);
        }
        Ok(())
    }

    fn spawn_worker(&self, session_id: Uuid) -> mpsc::UnboundedSender<Job> {
        let (inbox, jobs) = mpsc::unbounded_channel();
        tokio::spawn(worker::run(self.clone(), session_id, jobs));
        inbox
    }

    /// Stops accepting work for a session. Jobs already queued still run and
    /// fail against the retired session.
    pub async fn retire_worker(&self, session_id: Uuid) {
        if self.inner.workers.lock().await.remove(&session_id).is_some() {
            debug!(%session_id, "session worker retired");
        }
    }

    /// Routes the session's events to `outbound` from now on.
    pub async fn link(&self, session_id: Uuid, connection_id: Uuid, outbound: Outbound) {
        let previous = self.inner.links.lock().await.insert(
            session_id,
            Link {
                connection_id,
                outbound,
            },
        );
        if let Some(previous) = previous {
            if previous.connection_id != connection_id {
                info!(%session_id, from = %previous.connection_id, to = %connection_id, "session moved to a new connection");
            }
        }
    }

    /// Removes the link if it still points at `connection_id`. Returns
    /// whether it did.
    pub async fn unlink(&self, session_id: Uuid, connection_id: Uuid) -> bool {
        let mut links = self.inner.links.lock().await;
        match links.get(&session_id) {
            Some(link) if link.connection_id == connection_id => {
                links.remove(&session_id);
                true
            }
            _ => false,
        }
    }

    /// Retires the worker and drops the link of a session that no longer
    /// exists.
    pub async fn forget(&self, session_id: Uuid) {
        self.retire_worker(session_id).await;
        self.inner.links.lock().await.remove(&session_id);
    }

    /// Sends `messages`, in order, to the session's connection. Without a
    /// linked connection they are dropped.
    pub async fn publish(&self, session_id: Uuid, messages: Vec<ServerMessage>) {
        if messages.is_empty() {
            return;
        }
        let links = self.inner.links.lock().await;
        let Some(link) = links.get(&session_id) else {
            warn!(%session_id, dropped = messages.len(), "no connection linked; dropping events");
            return;
        };
        for message in messages {
            if link.outbound.send(message).is_err() {
                warn!(%session_id, connection_id = %link.connection_id, "connection closed; dropping events");
                return;
            }
        }
    }
}

/// Waits for a worker's reply.
///
/// # Errors
///
/// Returns the action's own error, or `GameError::Infrastructure` if the
/// worker went away without answering.
pub async fn await_reply<T>(reply: Reply<T>) -> Result<T, GameError> {
    reply
        .await
        .map_err(|_| GameError::Infrastructure("session worker stopped before replying".to_owned()))?
}
