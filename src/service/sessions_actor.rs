use std::collections::HashMap;
use std::time::{Duration, Instant};

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tracing::{debug, info};

use crate::error::AskDbError;
use crate::service::session::{Session, SessionId};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Messages handled by the sessions actor.
#[derive(Debug)]
pub enum SessionsActorMessage {
    /// Current state of a live session, `None` for unknown or expired ids.
    Load(SessionId, RpcReplyPort<Option<Session>>),
    /// First write for an id the actor did not know when the request started.
    Create(SessionId, Session),
    /// Write back a loaded session; ignored once the session has been removed.
    Update(SessionId, Session),
    /// Forget a session entirely.
    Remove(SessionId),
    /// Drop sessions idle for longer than the configured timeout.
    Sweep,
    #[cfg(test)]
    Count(RpcReplyPort<usize>),
}

/// Handle for interacting with the sessions actor.
#[derive(Clone)]
pub struct SessionsHandle {
    actor: ActorRef<SessionsActorMessage>,
}

impl SessionsHandle {
    pub async fn load(&self, id: SessionId) -> Result<Option<Session>, AskDbError> {
        ractor::call!(self.actor, SessionsActorMessage::Load, id)
            .map_err(|e| AskDbError::RactorError(format!("Load session RPC failed: {e}")))
    }

    pub fn create(&self, id: SessionId, session: Session) {
        let _ = ractor::cast!(self.actor, SessionsActorMessage::Create(id, session));
    }

    pub fn update(&self, id: SessionId, session: Session) {
        let _ = ractor::cast!(self.actor, SessionsActorMessage::Update(id, session));
    }

    pub fn remove(&self, id: SessionId) {
        let _ = ractor::cast!(self.actor, SessionsActorMessage::Remove(id));
    }

    #[cfg(test)]
    pub(crate) async fn live_sessions(&self) -> usize {
        ractor::call!(self.actor, SessionsActorMessage::Count).unwrap()
    }
}

struct Entry {
    session: Session,
    last_seen: Instant,
}

impl Entry {
    fn new(session: Session) -> Self {
        Self {
            session,
            last_seen: Instant::now(),
        }
    }
}

struct SessionsState {
    entries: HashMap<SessionId, Entry>,
    idle_timeout: Duration,
}

impl SessionsState {
    fn is_expired(&self, entry: &Entry) -> bool {
        entry.last_seen.elapsed() > self.idle_timeout
    }

    fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        let idle_timeout = self.idle_timeout;
        self.entries
            .retain(|_, entry| entry.last_seen.elapsed() <= idle_timeout);
        before - self.entries.len()
    }
}

/// Owns every live session; all reads and writes are serialized through its mailbox.
struct SessionsActor;

#[ractor::async_trait]
impl Actor for SessionsActor {
    type Msg = SessionsActorMessage;
    type State = SessionsState;
    type Arguments = Duration;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        idle_timeout: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let period = SWEEP_INTERVAL.min(idle_timeout).max(Duration::from_secs(1));
        myself.send_interval(period, || SessionsActorMessage::Sweep);
        info!(idle_secs = idle_timeout.as_secs(), "SessionsActor started");
        Ok(SessionsState {
            entries: HashMap::new(),
            idle_timeout,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SessionsActorMessage::Load(id, reply) => {
                let expired = state
                    .entries
                    .get(&id)
                    .is_some_and(|entry| state.is_expired(entry));
                if expired {
                    state.entries.remove(&id);
                    debug!(session = %id, "expired session dropped on load");
                }
                let session = state.entries.get_mut(&id).map(|entry| {
                    entry.last_seen = Instant::now();
                    entry.session.clone()
                });
                let _ = reply.send(session);
            }
            SessionsActorMessage::Create(id, session) => {
                state.entries.insert(id, Entry::new(session));
            }
            SessionsActorMessage::Update(id, session) => match state.entries.get_mut(&id) {
                Some(entry) => *entry = Entry::new(session),
                None => debug!(session = %id, "write-back for ended session discarded"),
            },
            SessionsActorMessage::Remove(id) => {
                if state.entries.remove(&id).is_some() {
                    debug!(session = %id, live = state.entries.len(), "session removed");
                }
            }
            SessionsActorMessage::Sweep => {
                let evicted = state.sweep();
                if evicted > 0 {
                    info!(evicted, live = state.entries.len(), "idle sessions evicted");
                }
            }
            #[cfg(test)]
            SessionsActorMessage::Count(reply) => {
                let _ = reply.send(state.entries.len());
            }
        }
        Ok(())
    }
}

/// Spawn the sessions actor and return a handle.
pub async fn spawn(idle_timeout: Duration) -> Result<SessionsHandle, AskDbError> {
    let (actor, _jh) = Actor::spawn(None, SessionsActor, idle_timeout)
        .await
        .map_err(|e| AskDbError::RactorError(format!("failed to spawn SessionsActor: {e}")))?;
    Ok(SessionsHandle { actor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn logged_in() -> Session {
        let mut session = Session::default();
        session.authenticated = true;
        session.start_question("How many regions?");
        session
    }

    #[tokio::test]
    async fn unknown_session_is_absent() {
        let sessions = spawn(HOUR).await.unwrap();
        assert_eq!(sessions.load(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn created_session_is_returned_until_removed() {
        let sessions = spawn(HOUR).await.unwrap();
        let id = Uuid::new_v4();

        sessions.create(id, logged_in());
        assert_eq!(sessions.load(id).await.unwrap(), Some(logged_in()));

        sessions.remove(id);
        assert_eq!(sessions.load(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_after_remove_does_not_resurrect() {
        let sessions = spawn(HOUR).await.unwrap();
        let id = Uuid::new_v4();
        sessions.create(id, logged_in());

        let stale = sessions.load(id).await.unwrap().unwrap();
        sessions.remove(id);
        sessions.update(id, stale);

        assert_eq!(sessions.load(id).await.unwrap(), None);
        assert_eq!(sessions.live_sessions().await, 0);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let sessions = spawn(Duration::ZERO).await.unwrap();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        sessions.create(first, logged_in());
        sessions.create(second, logged_in());
        assert_eq!(sessions.live_sessions().await, 2);

        std::thread::sleep(Duration::from_millis(5));
        ractor::cast!(sessions.actor, SessionsActorMessage::Sweep).unwrap();
        assert_eq!(sessions.live_sessions().await, 0);

        sessions.create(first, logged_in());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(sessions.load(first).await.unwrap(), None);
    }
}
