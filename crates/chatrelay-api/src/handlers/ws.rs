use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use chatrelay_relay::{spawn_turn_worker, ClientFrame, SessionHandle, StreamChunk, TurnRequest};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::state::AppState;

/// Outbound chunks buffered per socket before the relay waits on the writer
const CHUNK_CHANNEL_CAPACITY: usize = 256;

/// Upgrade to the chat session socket for `client_id`
///
/// Mounted at `/ws/chat/:client_id`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, state))
}

/// One session: writer task, turn worker, and this reader loop
///
/// Closing the socket cancels the in-flight turn. Nothing generated after the
/// disconnect is persisted. A newer socket registering the same client id
/// cancels this session's worker, which ends the reader loop too.
async fn handle_socket(socket: WebSocket, client_id: String, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (chunk_tx, mut chunk_rx) = mpsc::channel::<StreamChunk>(CHUNK_CHANNEL_CAPACITY);
    let session = state.registry.register(&client_id, chunk_tx).await;
    let connection_id = session.connection_id();

    let writer = tokio::spawn(async move {
        while let Some(chunk) = chunk_rx.recv().await {
            let json = match serde_json::to_string(&chunk) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!("Failed to serialize StreamChunk: {err}");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                // Client disconnected
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let (turn_tx, mut worker) = spawn_turn_worker(Arc::clone(&state.relay), client_id.clone());
    state
        .registry
        .attach_worker(&client_id, connection_id, worker.abort_handle())
        .await;

    let mut worker_finished = false;
    loop {
        tokio::select! {
            msg_result = ws_receiver.next() => match msg_result {
                Some(Ok(Message::Text(text))) => {
                    process_frame(&text, &client_id, &session, &turn_tx).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ignore binary, ping, pong protocol frames (handled by axum/tungstenite)
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!(client_id = %client_id, "WebSocket receive error: {err}");
                    break;
                }
            },
            _ = &mut worker => {
                // Only a replacement cancels the worker while we hold `turn_tx`
                tracing::info!(client_id = %client_id, connection_id, "Session superseded, closing socket");
                worker_finished = true;
                break;
            }
        }
    }

    if !worker_finished {
        worker.abort();
        let _ = worker.await;
    }
    drop(turn_tx);
    drop(session);
    state
        .registry
        .unregister_connection(&client_id, connection_id)
        .await;
    let _ = writer.await;

    tracing::debug!(client_id = %client_id, connection_id, "WebSocket connection closed");
}

/// Decode one text frame and dispatch it
///
/// Malformed frames and unknown types are logged and ignored. A `message`
/// frame with invalid fields is answered with an error and `done`, since the
/// client is waiting on a turn.
async fn process_frame(
    text: &str,
    client_id: &str,
    session: &SessionHandle,
    turns: &mpsc::Sender<TurnRequest>,
) {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(
                client_id,
                raw = %text,
                error = %err,
                "Ignoring malformed WebSocket frame"
            );
            if is_message_frame(text) {
                reject_turn(session, format!("Error: invalid message frame: {err}")).await;
            }
            return;
        }
    };

    match frame {
        ClientFrame::Message(request) => match turns.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(client_id, "Turn queue full, rejecting message");
                reject_turn(session, "Error: too many queued messages".to_string()).await;
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(client_id, "Turn worker gone, dropping message");
            }
        },
        ClientFrame::Abort => {
            session.request_abort();
            tracing::info!(client_id, "Abort requested");
        }
    }
}

fn is_message_frame(text: &str) -> bool {
    serde_json::from_str::<Value>(text)
        .ok()
        .is_some_and(|value| value.get("type").and_then(Value::as_str) == Some("message"))
}

async fn reject_turn(session: &SessionHandle, error: String) {
    session.send(StreamChunk::error(error)).await;
    session.send(StreamChunk::Done).await;
}
