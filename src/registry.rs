//! Session registry
//!
//! Sole authority over which sessions exist, which username each holds
//! and which room each is in. Usernames are reserved through a
//! [`UsernameLedger`] so uniqueness is enforced in one place.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::RegistryError;
use crate::ledger::{InMemoryLedger, UsernameLedger};
use crate::message::ServerMessage;
use crate::room::RoomDirectory;
use crate::session::Session;
use crate::types::{SessionId, DEFAULT_ROOM};

/// Acknowledgment returned by a successful `authenticate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAck {
    /// Known rooms at the time of authentication
    pub rooms: Vec<String>,
    /// Authenticated sessions, including the new one
    pub user_count: usize,
}

/// All live sessions keyed by id
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    ledger: Box<dyn UsernameLedger>,
}

impl SessionRegistry {
    /// Create an empty registry with an in-memory ledger
    pub fn new() -> Self {
        Self::with_ledger(Box::new(InMemoryLedger::new()))
    }

    /// Create an empty registry reserving names through `ledger`
    pub fn with_ledger(ledger: Box<dyn UsernameLedger>) -> Self {
        Self {
            sessions: HashMap::new(),
            ledger,
        }
    }

    /// Register an unauthenticated session for a new connection
    pub fn register(&mut self, sender: mpsc::Sender<ServerMessage>) -> SessionId {
        let id = SessionId::new();
        self.sessions.insert(id, Session::new(id, sender));
        debug!("Registered session {} ({} total)", id, self.sessions.len());
        id
    }

    /// Bind a username to a session and place it in the default room
    ///
    /// Nothing changes if the name is taken or the session cannot
    /// authenticate.
    pub fn authenticate(
        &mut self,
        id: SessionId,
        username: &str,
        rooms: &RoomDirectory,
    ) -> Result<AuthAck, RegistryError> {
        let session = self.sessions.get(&id).ok_or(RegistryError::UnknownSession)?;
        if session.is_authenticated() {
            return Err(RegistryError::AlreadyAuthenticated);
        }

        if !self.ledger.reserve(username) {
            return Err(RegistryError::UsernameTaken);
        }

        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::UnknownSession)?;
        session.username = Some(username.to_string());
        session.room = Some(DEFAULT_ROOM.to_string());

        Ok(AuthAck {
            rooms: rooms.list(),
            user_count: self.authenticated_count(),
        })
    }

    /// Move an authenticated session to `room`
    ///
    /// Returns the room the session was in before the move.
    pub fn set_room(&mut self, id: SessionId, room: &str) -> Result<String, RegistryError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::UnknownSession)?;
        if !session.is_authenticated() {
            return Err(RegistryError::NotAuthenticated);
        }

        let previous = session.room.replace(room.to_string());
        Ok(previous.unwrap_or_else(|| DEFAULT_ROOM.to_string()))
    }

    /// Remove a session and release its username
    ///
    /// Returns the removed session, or None if it was already gone.
    pub fn unregister(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        if let Some(username) = &session.username {
            self.ledger.release(username);
        }
        debug!("Unregistered session {} ({} left)", id, self.sessions.len());
        Some(session)
    }

    /// Authenticated sessions currently in `room`
    ///
    /// The registry is owned by a single task, so membership cannot change
    /// while the iterator is alive.
    pub fn sessions_in_room<'a>(&'a self, room: &'a str) -> impl Iterator<Item = SessionId> + 'a {
        self.sessions
            .values()
            .filter(move |s| s.is_authenticated() && s.is_in(room))
            .map(|s| s.id)
    }

    /// Every registered session, authenticated or not
    pub fn all(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.keys().copied()
    }

    /// Look up a session
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Number of registered sessions in any state
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of sessions that have bound a username
    pub fn authenticated_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.is_authenticated())
            .count()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
