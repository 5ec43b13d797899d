//! Session struct definition
//!
//! Represents one connected client: its outbound queue, and once
//! authenticated, its username and current room.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::SessionId;

/// Connected client state
///
/// `username` and `room` are set together on authentication and are
/// `None` before that.
#[derive(Debug)]
pub struct Session {
    /// Unique identifier for this session
    pub id: SessionId,
    /// Display name (None before authentication)
    pub username: Option<String>,
    /// Current room (None before authentication)
    pub room: Option<String>,
    /// Server → Client message queue
    sender: mpsc::Sender<ServerMessage>,
}

impl Session {
    /// Create an unauthenticated session bound to the given queue
    pub fn new(id: SessionId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            username: None,
            room: None,
            sender,
        }
    }

    /// Enqueue a message for this session without waiting
    ///
    /// Fails if the connection has gone away or its queue is full.
    pub fn try_send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::ChannelFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Check whether the connection side of the queue is still open
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Get the display name for this session
    ///
    /// Returns the username if set, otherwise "Unknown".
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("Unknown")
    }

    /// Check if this session has completed authentication
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    /// Check if this session is currently in `room`
    pub fn is_in(&self, room: &str) -> bool {
        self.room.as_deref() == Some(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let session = Session::new(SessionId::new(), tx);

        assert!(session.username.is_none());
        assert!(session.room.is_none());
        assert!(!session.is_authenticated());
        assert!(session.is_open());
        assert_eq!(session.display_name(), "Unknown");
    }

    #[tokio::test]
    async fn test_try_send_delivers() {
        let (tx, mut rx) = mpsc::channel(32);
        let session = Session::new(SessionId::new(), tx);

        session.try_send(ServerMessage::UserCount { count: 3 }).unwrap();
        assert_eq!(rx.recv().await, Some(ServerMessage::UserCount { count: 3 }));
    }

    #[tokio::test]
    async fn test_try_send_full_and_closed() {
        let (tx, rx) = mpsc::channel(1);
        let session = Session::new(SessionId::new(), tx);

        session.try_send(ServerMessage::UserCount { count: 1 }).unwrap();
        assert_eq!(
            session.try_send(ServerMessage::UserCount { count: 2 }),
            Err(SendError::ChannelFull)
        );

        drop(rx);
        assert!(!session.is_open());
        assert_eq!(
            session.try_send(ServerMessage::UserCount { count: 3 }),
            Err(SendError::ChannelClosed)
        );
    }

    #[tokio::test]
    async fn test_is_in_room() {
        let (tx, _rx) = mpsc::channel(32);
        let mut session = Session::new(SessionId::new(), tx);
        assert!(!session.is_in("Global"));

        session.username = Some("alice".to_string());
        session.room = Some("Global".to_string());
        assert!(session.is_in("Global"));
        assert!(!session.is_in("global"));
        assert_eq!(session.display_name(), "alice");
    }
}
