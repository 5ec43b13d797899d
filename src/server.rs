//! ChatServer Actor implementation
//!
//! The central actor that owns the session registry and room directory.
//! Every mutation arrives as a `ServerCommand` over an mpsc channel and is
//! handled to completion before the next, which makes each registry
//! operation atomic without locks.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::broadcast::{BroadcastReport, Broadcaster, Delivery};
use crate::error::RegistryError;
use crate::message::ServerMessage;
use crate::registry::SessionRegistry;
use crate::room::RoomDirectory;
use crate::types::SessionId;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection; the assigned id is sent back on `reply`
    Connect {
        sender: mpsc::Sender<ServerMessage>,
        reply: oneshot::Sender<SessionId>,
    },
    /// Connection closed
    Disconnect {
        session_id: SessionId,
    },
    /// Claim a username
    Authenticate {
        session_id: SessionId,
        username: String,
    },
    /// Send a chat message to the current room
    Message {
        session_id: SessionId,
        content: String,
    },
    /// Create a room
    CreateRoom {
        session_id: SessionId,
        room_name: String,
    },
    /// Move to another room
    JoinRoom {
        session_id: SessionId,
        room_name: String,
    },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// Live sessions
    sessions: SessionRegistry,
    /// Known rooms
    rooms: RoomDirectory,
    /// Sessions found closed during a broadcast, awaiting cleanup
    stale: Vec<SessionId>,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self::with_registry(receiver, SessionRegistry::new())
    }

    /// Create a ChatServer around an existing registry
    pub fn with_registry(receiver: mpsc::Receiver<ServerCommand>, sessions: SessionRegistry) -> Self {
        Self {
            sessions,
            rooms: RoomDirectory::new(),
            stale: Vec::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
            self.reap_stale();
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { sender, reply } => {
                self.handle_connect(sender, reply);
            }
            ServerCommand::Disconnect { session_id } => {
                self.handle_disconnect(session_id);
            }
            ServerCommand::Authenticate {
                session_id,
                username,
            } => {
                self.handle_authenticate(session_id, username);
            }
            ServerCommand::Message {
                session_id,
                content,
            } => {
                self.handle_message(session_id, content);
            }
            ServerCommand::CreateRoom {
                session_id,
                room_name,
            } => {
                self.handle_create_room(session_id, room_name);
            }
            ServerCommand::JoinRoom {
                session_id,
                room_name,
            } => {
                self.handle_join_room(session_id, room_name);
            }
        }
    }

    /// Handle new connection
    fn handle_connect(
        &mut self,
        sender: mpsc::Sender<ServerMessage>,
        reply: oneshot::Sender<SessionId>,
    ) {
        let session_id = self.sessions.register(sender);
        if reply.send(session_id).is_err() {
            // Handler went away before learning its id
            self.sessions.unregister(session_id);
            return;
        }
        info!("Session {} connected", session_id);
        debug!(
            "Total sessions: {}, Total rooms: {}",
            self.sessions.count(),
            self.rooms.len()
        );
    }

    /// Handle disconnection
    fn handle_disconnect(&mut self, session_id: SessionId) {
        let Some(session) = self.sessions.unregister(session_id) else {
            return;
        };
        info!("Session {} ({}) disconnected", session_id, session.display_name());

        let (Some(username), Some(room)) = (session.username, session.room) else {
            return;
        };

        let count = ServerMessage::UserCount {
            count: self.sessions.authenticated_count(),
        };
        let report = self.broadcaster().broadcast_all(&count);
        self.collect_stale(report);

        let notice = ServerMessage::system(format!("{} disconnected", username));
        let report = self.broadcaster().broadcast_room(&room, &notice);
        self.collect_stale(report);
    }

    /// Handle username claim
    fn handle_authenticate(&mut self, session_id: SessionId, username: String) {
        match self.sessions.authenticate(session_id, &username, &self.rooms) {
            Ok(ack) => {
                info!("Session {} authenticated as '{}'", session_id, username);
                self.send_to(
                    session_id,
                    ServerMessage::Authenticated {
                        rooms: ack.rooms,
                        user_count: ack.user_count,
                    },
                );

                let count = ServerMessage::UserCount {
                    count: ack.user_count,
                };
                let report = self.broadcaster().broadcast_all(&count);
                self.collect_stale(report);
            }
            Err(RegistryError::UsernameTaken) => {
                debug!("Session {} requested taken name '{}'", session_id, username);
                self.send_to(session_id, RegistryError::UsernameTaken.into());
            }
            Err(e) => {
                debug!("Ignoring authenticate from {}: {}", session_id, e);
            }
        }
    }

    /// Handle chat message
    ///
    /// The room is taken from the registry, never from the client.
    fn handle_message(&mut self, session_id: SessionId, content: String) {
        let Some(session) = self.sessions.get(session_id) else {
            return;
        };
        let (Some(username), Some(room)) = (session.username.clone(), session.room.clone()) else {
            debug!("Dropping message from unauthenticated session {}", session_id);
            return;
        };

        let event = ServerMessage::chat(content, username, room.clone());
        let report = self.broadcaster().broadcast_room(&room, &event);
        debug!(
            "Message from {} delivered to {} session(s) in '{}'",
            session_id, report.delivered, room
        );
        self.collect_stale(report);
    }

    /// Handle room creation
    fn handle_create_room(&mut self, session_id: SessionId, room_name: String) {
        if !self.rooms.create(&room_name) {
            debug!("Room '{}' already exists", room_name);
            return;
        }
        info!("Session {} created room '{}'", session_id, room_name);

        let list = ServerMessage::RoomList {
            rooms: self.rooms.list(),
        };
        let report = self.broadcaster().broadcast_all(&list);
        self.collect_stale(report);
    }

    /// Handle room change
    fn handle_join_room(&mut self, session_id: SessionId, room_name: String) {
        let old_room = match self.sessions.set_room(session_id, &room_name) {
            Ok(old_room) => old_room,
            Err(e) => {
                debug!("Ignoring joinRoom from {}: {}", session_id, e);
                return;
            }
        };
        let username = self
            .sessions
            .get(session_id)
            .map(|s| s.display_name().to_string())
            .unwrap_or_default();

        info!(
            "Session {} ({}) moved from '{}' to '{}'",
            session_id, username, old_room, room_name
        );

        self.send_to(
            session_id,
            ServerMessage::RoomJoined {
                room: room_name.clone(),
            },
        );

        let left = ServerMessage::system(format!("{} left the room", username));
        let report = self.broadcaster().broadcast_room(&old_room, &left);
        self.collect_stale(report);

        let joined = ServerMessage::system(format!("{} joined the room", username));
        let report = self.broadcaster().broadcast_room(&room_name, &joined);
        self.collect_stale(report);
    }

    /// Helper: Deliver directly to one session
    fn send_to(&mut self, session_id: SessionId, event: ServerMessage) {
        if self.broadcaster().send_to(session_id, event) == Delivery::Closed {
            self.stale.push(session_id);
        }
    }

    /// Helper: Remember sessions a broadcast found closed
    fn collect_stale(&mut self, report: BroadcastReport) {
        self.stale.extend(report.closed);
    }

    /// Helper: Run closed sessions through the disconnect path
    ///
    /// Each disconnect may uncover more closed sessions; unregister is
    /// idempotent and removed sessions are never broadcast to again, so
    /// this terminates.
    fn reap_stale(&mut self) {
        while let Some(session_id) = self.stale.pop() {
            self.handle_disconnect(session_id);
        }
    }

    fn broadcaster(&self) -> Broadcaster<'_> {
        Broadcaster::new(&self.sessions)
    }
}
