//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enum
//! for type-safe serialization/deserialization. Tags and field names are
//! camelCase on the wire.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Client → Server message
///
/// Unknown fields are ignored, so a `room` sent alongside `message`
/// has no effect: the room always comes from the sender's session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Claim a display name
    Authenticate { username: String },
    /// Send a chat message to the current room
    Message { content: String },
    /// Create a new room
    CreateRoom {
        #[serde(rename = "roomName")]
        room_name: String,
    },
    /// Move to another room
    JoinRoom {
        #[serde(rename = "roomName")]
        room_name: String,
    },
}

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Request rejected
    Error { content: String },
    /// Username bound, session is now in the default room
    Authenticated {
        rooms: Vec<String>,
        #[serde(rename = "userCount")]
        user_count: usize,
    },
    /// Chat message relayed to a room
    Message {
        content: String,
        username: String,
        timestamp: String,
        room: String,
    },
    /// Full list of known rooms
    RoomList { rooms: Vec<String> },
    /// Acknowledges a room change to the mover
    RoomJoined { room: String },
    /// Join, leave and disconnect notices
    SystemMessage { content: String },
    /// Number of authenticated sessions
    UserCount { count: usize },
}

impl ServerMessage {
    /// Build a chat message stamped with the current UTC time
    pub fn chat(content: String, username: String, room: String) -> Self {
        ServerMessage::Message {
            content,
            username,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            room,
        }
    }

    /// Build a system notice
    pub fn system(content: impl Into<String>) -> Self {
        ServerMessage::SystemMessage {
            content: content.into(),
        }
    }
}

/// Convert RegistryError to ServerMessage for client notification
impl From<RegistryError> for ServerMessage {
    fn from(err: RegistryError) -> Self {
        ServerMessage::Error {
            content: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_deserialize() {
        let json = r#"{"type": "authenticate", "username": "alice"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Authenticate {
                username: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_room_commands_use_room_name_field() {
        let json = r#"{"type": "createRoom", "roomName": "Dev"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                room_name: "Dev".to_string()
            }
        );

        let json = r#"{"type": "joinRoom", "roomName": "Dev"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::JoinRoom { room_name } if room_name == "Dev"));
    }

    #[test]
    fn test_message_ignores_client_room() {
        let json = r#"{"type": "message", "content": "hi", "room": "Elsewhere"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Message {
                content: "hi".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{"type": "typing"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "authenticate"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialize() {
        let msg = ServerMessage::Authenticated {
            rooms: vec!["Global".to_string()],
            user_count: 1,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "authenticated", "rooms": ["Global"], "userCount": 1})
        );

        let value = serde_json::to_value(ServerMessage::system("bob joined the room")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "systemMessage", "content": "bob joined the room"})
        );

        let value = serde_json::to_value(ServerMessage::RoomList {
            rooms: vec!["Global".to_string(), "Dev".to_string()],
        })
        .unwrap();
        assert_eq!(value["type"], "roomList");
    }

    #[test]
    fn test_chat_timestamp_is_iso8601_utc() {
        let msg = ServerMessage::chat("hi".to_string(), "alice".to_string(), "Global".to_string());
        let ServerMessage::Message { timestamp, .. } = &msg else {
            panic!("Wrong variant");
        };
        assert!(timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["username"], "alice");
        assert_eq!(value["room"], "Global");
    }

    #[test]
    fn test_registry_error_to_server_message() {
        let msg: ServerMessage = RegistryError::UsernameTaken.into();
        assert_eq!(
            msg,
            ServerMessage::Error {
                content: "Username already taken".to_string()
            }
        );
    }
}
