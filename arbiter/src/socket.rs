use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tacta::ClientMessage;
use tracing::warn;

use crate::{ConnId, OutboundFrame, RoomCommand, RoomHandle};

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(0);

/// Pumps one WebSocket connection into and out of a room.
///
/// Inbound frames are decoded here so the room only ever sees well-typed
/// messages; an undecodable frame closes this connection and nothing else.
/// Outbound frames are queued by the room and written by a separate task, so
/// a slow client never blocks the room authority.
pub async fn serve_socket(socket: WebSocket, handle: RoomHandle) {
    let conn = ConnId(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed));
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<OutboundFrame>();

    if handle.tx.send(RoomCommand::Connect { conn, tx }).is_err() {
        // The room exited between lookup and connect; the client retries.
        let _ = ws_tx.send(Message::Close(None)).await;
        return;
    }

    let write_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                OutboundFrame::Text(text) => {
                    if ws_tx.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                OutboundFrame::Close => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    if handle.tx.send(RoomCommand::Inbound { conn, msg }).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(?conn, ?err, "undecodable message, closing connection");
                    break;
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    let _ = handle.tx.send(RoomCommand::Disconnect { conn });
    // Let the writer drain; it ends once the room drops this connection's
    // queue.
    let _ = write_task.await;
}
