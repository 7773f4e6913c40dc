//! WebSocket handler for client connections.
//!
//! Handles the upgrade, joins the owner's group for the life of the socket,
//! and leaves it on close. Outbound frames arrive through the registry
//! channel; inbound text frames are parsed as [`ClientMessage`] and anything
//! unparseable is ignored.

use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use futures::sink::SinkExt;
use futures::stream::{SplitSink, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::connection::ConnectionManager;
use super::messages::WsMessage;
use crate::gateway::state::AppState;

/// WebSocket connection query parameters.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Owner identifier; the connection joins this owner's group.
    pub owner: String,
}

/// Frames a client may send, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClientMessage {
    /// Application-level keepalive; answered with a `Pong` frame.
    Ping,
}

/// WebSocket upgrade handler.
///
/// Endpoint: `GET /ws?owner=alice@example.com`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let manager = state.ws_manager.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, params.owner, manager))
}

/// Connection lifecycle: register, interleave pushed frames with client
/// traffic in one loop, deregister on close.
async fn handle_socket(socket: WebSocket, owner: String, manager: Arc<ConnectionManager>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let conn_id = manager.add_connection(&owner, tx);

    let welcome = WsMessage::Connected {
        owner: owner.clone(),
    };
    if send_frame(&mut sink, &welcome).await.is_err() {
        manager.remove_connection(&owner, conn_id);
        return;
    }

    loop {
        tokio::select! {
            pushed = rx.recv() => {
                let Some(frame) = pushed else { break };
                if send_frame(&mut sink, &frame).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = reply_to(&text) {
                            if send_frame(&mut sink, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    // Protocol-level ping; answer in kind.
                    Some(Ok(Message::Ping(payload))) => {
                        if sink.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(owner = %owner, error = %e, "WebSocket read error");
                        break;
                    }
                }
            }
        }
    }

    manager.remove_connection(&owner, conn_id);
}

/// Parse one inbound text frame and produce the reply, if any.
fn reply_to(text: &str) -> Option<WsMessage> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => Some(WsMessage::Pong),
        Err(_) => None,
    }
}

async fn send_frame(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: &WsMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame).map_err(axum::Error::new)?;
    sink.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_frame_gets_a_pong() {
        let reply = reply_to(r#"{"type":"ping"}"#);
        assert!(matches!(reply, Some(WsMessage::Pong)));
    }

    #[test]
    fn test_unknown_and_malformed_frames_are_ignored() {
        assert!(reply_to(r#"{"type":"subscribe"}"#).is_none());
        assert!(reply_to("not json at all").is_none());
        // A "ping" in the payload body is not a ping frame.
        assert!(reply_to(r#"{"kind":"ping","note":"ping"}"#).is_none());
    }
}
