//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake,
//! frame decoding, and bidirectional communication with the ChatServer.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{ClientMessage, ServerMessage};
use crate::server::ServerCommand;
use crate::types::SessionId;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, registers a session with the
/// ChatServer, then pumps frames both ways until either side closes.
/// Events for this client are queued in a channel of `client_buffer`
/// slots so the server never waits on the socket.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    client_buffer: usize,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Create channel for server -> client messages
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(client_buffer);

    // Register with ChatServer
    let (reply_tx, reply_rx) = oneshot::channel();
    if cmd_tx
        .send(ServerCommand::Connect {
            sender: msg_tx,
            reply: reply_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register {} - server closed", peer_addr);
        return Err(AppError::ChannelSend);
    }
    let session_id = reply_rx.await.map_err(|_| AppError::ChannelSend)?;
    info!("Session {} connected from {}", session_id, peer_addr);

    // Clone cmd_tx for read task
    let cmd_tx_read = cmd_tx.clone();

    // Spawn read task (WebSocket -> ServerCommand)
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match decode(&text) {
                    Ok(client_msg) => {
                        let cmd = client_message_to_command(session_id, client_msg);
                        if cmd_tx_read.send(cmd).await.is_err() {
                            debug!("Server closed, ending read task for {}", session_id);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Dropping malformed frame from {}: {}", session_id, e);
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("Session {} sent close frame", session_id);
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Pong replies are handled by tungstenite
                }
                Ok(_) => {
                    debug!("Ignoring non-text frame from {}", session_id);
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", session_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", session_id);
    });

    // Spawn write task (ServerMessage -> WebSocket)
    let write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                }
            }
        }
        debug!("Write task ended for {}", session_id);

        let _ = ws_sender.close().await;
    });

    // Wait for either task to complete
    let read_abort = read_task.abort_handle();
    let write_abort = write_task.abort_handle();
    tokio::select! {
        _ = read_task => {
            debug!("Read task completed for {}", session_id);
            write_abort.abort();
        }
        _ = write_task => {
            debug!("Write task completed for {}", session_id);
            read_abort.abort();
        }
    }

    // Send disconnect command
    let _ = cmd_tx.send(ServerCommand::Disconnect { session_id }).await;

    info!("Session {} disconnected", session_id);

    Ok(())
}

/// Decode one inbound text frame
pub fn decode(text: &str) -> Result<ClientMessage, AppError> {
    Ok(serde_json::from_str(text)?)
}

/// Convert a ClientMessage to a ServerCommand
fn client_message_to_command(session_id: SessionId, msg: ClientMessage) -> ServerCommand {
    match msg {
        ClientMessage::Authenticate { username } => ServerCommand::Authenticate { session_id, username },
        ClientMessage::Message { content } => ServerCommand::Message { session_id, content },
        ClientMessage::CreateRoom { room_name } => ServerCommand::CreateRoom { session_id, room_name },
        ClientMessage::JoinRoom { room_name } => ServerCommand::JoinRoom { session_id, room_name },
    }
}
