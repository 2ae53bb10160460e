//! WebSocket upgrade and frame pump.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use standoff_protocol::ServerMessage;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::connection::{Connection, ConnectionFlow};
use crate::state::AppState;

/// Upgrades the request to a game channel.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound, mut frames) = mpsc::unbounded_channel::<ServerMessage>();
    let mut connection = Connection::new(state, outbound.clone());
    let connection_id = connection.id();
    info!(%connection_id, "client connected");

    // Single writer: frames leave in the order they were queued.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to serialize frame");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if connection.handle_frame(text.as_str()).await == ConnectionFlow::Close {
                    debug!(%connection_id, "client asked to stop");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                let rejection = ServerMessage::validation("binary frames are not supported");
                if outbound.send(rejection).is_err() {
                    debug!(%connection_id, "outbound queue closed");
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                debug!(%connection_id, error = %e, "socket error");
                break;
            }
        }
    }

    connection.close().await;
    send_task.abort();
    info!(%connection_id, "client disconnected");
}
