//! Room-based WebSocket Chat Relay Library
//!
//! A WebSocket chat relay built with tokio-tungstenite using the Actor
//! pattern for state management.
//!
//! # Features
//! - WebSocket connection handling
//! - Unique display names
//! - Named rooms, created on demand, with `Global` as the default
//! - Room-scoped message fan-out
//! - Join, leave and disconnect notices
//! - Live user count and room list updates
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the `SessionRegistry` and
//!   `RoomDirectory`
//! - `Broadcaster` delivers events by enqueueing onto per-session channels
//! - Each connection has a `handler` task communicating with the server
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_relay::{ChatServer, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx, 32));
//!     }
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod error;
pub mod handler;
pub mod ledger;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{BroadcastReport, Broadcaster, Delivery};
pub use config::ServerConfig;
pub use error::{AppError, RegistryError, SendError};
pub use handler::handle_connection;
pub use ledger::{InMemoryLedger, UsernameLedger};
pub use message::{ClientMessage, ServerMessage};
pub use registry::{AuthAck, SessionRegistry};
pub use room::RoomDirectory;
pub use server::{ChatServer, ServerCommand};
pub use session::Session;
pub use types::{SessionId, DEFAULT_ROOM};
