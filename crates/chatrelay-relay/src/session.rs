use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::relay::MessageRelay;
use crate::types::TurnRequest;

/// Turns a session may queue behind the one streaming
pub const TURN_QUEUE_CAPACITY: usize = 16;

/// Spawn the task that runs a session's turns one at a time
///
/// The worker ends when every sender is dropped. Aborting the handle cancels
/// the in-flight turn and drops its upstream stream.
pub fn spawn_turn_worker(
    relay: Arc<MessageRelay>,
    client_id: String,
) -> (mpsc::Sender<TurnRequest>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<TurnRequest>(TURN_QUEUE_CAPACITY);

    let handle = tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            tracing::debug!(client_id = %client_id, command = ?request.command, "Turn started");
            relay.handle_turn(&client_id, request).await;
        }
        tracing::debug!(client_id = %client_id, "Turn worker stopped");
    });

    (tx, handle)
}
