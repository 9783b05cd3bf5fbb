use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Streams every stored or updated booking to the client as JSON.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.booking_events_tx.subscribe();

    info!("websocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            let booking = match rx.recv().await {
                Ok(booking) => booking,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging; dropped booking events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let json = match serde_json::to_string(&booking) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize booking for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    first_to_finish(send_task, recv_task).await;

    info!("websocket client disconnected");
}

/// Waits for either task and aborts the other one.
async fn first_to_finish<A, B>(mut a: JoinHandle<A>, mut b: JoinHandle<B>) {
    tokio::select! {
        _ = &mut a => b.abort(),
        _ = &mut b => a.abort(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::first_to_finish;

    #[tokio::test]
    async fn finished_task_aborts_its_partner() {
        let (alive_tx, alive_rx) = oneshot::channel::<()>();

        let done = tokio::spawn(async {});
        let stuck = tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
        });

        first_to_finish(done, stuck).await;

        // The sender is dropped once the stuck task is cancelled.
        let closed = tokio::time::timeout(Duration::from_secs(1), alive_rx)
            .await
            .expect("stuck task was not aborted");
        assert!(closed.is_err());
    }
}
