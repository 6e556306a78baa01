use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

use crate::bridge::Subscriptions;
use crate::connection_manager::ConnectionHandle;
use crate::metrics::{BridgeMetrics, ConnectionMetrics};
use crate::server::AppState;

use super::message::EventFrame;

/// How long a server-side disconnect waits for queued frames and the Close frame
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Why a session ended; sent as the `disconnect` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer sent a close frame
    ClientDisconnect,
    /// The server unregistered the connection
    ServerDisconnect,
    /// The stream ended without a close frame, or the writer stopped
    TransportClose,
    /// Reading from the socket failed
    TransportError,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientDisconnect => "client namespace disconnect",
            Self::ServerDisconnect => "server namespace disconnect",
            Self::TransportClose => "transport close",
            Self::TransportError => "transport error",
        }
    }
}

/// WebSocket upgrade handler
#[tracing::instrument(name = "ws.upgrade", skip(ws, state))]
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection
#[tracing::instrument(name = "ws.connection", skip(socket, state), fields(otel.kind = "server"))]
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_start = std::time::Instant::now();

    // Create channel for sending frames to this connection
    let (tx, rx) = mpsc::channel::<EventFrame>(state.settings.socket.channel_buffer.max(1));
    let handle = Arc::new(ConnectionHandle::with_generated_id(tx));
    let connection_id = handle.id.clone();

    if !state.registry.register(handle.clone()) {
        tracing::warn!(connection_id = %connection_id, "Duplicate connection id, dropping socket");
        return;
    }
    ConnectionMetrics::record_opened();

    tracing::info!(connection_id = %connection_id, "Socket connection established");

    let mut subscriptions = state.bridge.attach(&connection_id);
    state
        .bridge
        .fire(&subscriptions, "connect", Value::Null)
        .await;

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Task for writing queued frames to the socket; a close request flushes what is
    // queued, then ends the session with a Close frame
    let (close_tx, mut close_rx) = oneshot::channel::<()>();
    let mut send_task = tokio::spawn(async move {
        let mut frames = ReceiverStream::new(rx);
        loop {
            tokio::select! {
                biased;
                frame = frames.next() => {
                    let Some(frame) = frame else { break };
                    let text = match frame.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize frame");
                            continue;
                        }
                    };

                    if ws_sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = &mut close_rx => {
                    let close = CloseFrame {
                        code: close_code::NORMAL,
                        reason: Utf8Bytes::from_static(DisconnectReason::ServerDisconnect.as_str()),
                    };
                    let _ = ws_sender.send(Message::Close(Some(close))).await;
                    break;
                }
            }
        }
    });

    // Frames are handled one at a time so records reach the pipeline in arrival order
    let reason = loop {
        tokio::select! {
            _ = handle.closed() => break DisconnectReason::ServerDisconnect,
            _ = &mut send_task => break DisconnectReason::TransportClose,
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(msg)) => {
                    if let Some(reason) = process_message(msg, &state, &subscriptions).await {
                        break reason;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket receive error");
                    state
                        .bridge
                        .fire(&subscriptions, "error", Value::String(e.to_string()))
                        .await;
                    break DisconnectReason::TransportError;
                }
                None => break DisconnectReason::TransportClose,
            }
        }
    };

    // Gone from the live set before the disconnect record is published
    state.registry.unregister(&connection_id);
    state
        .bridge
        .fire(
            &subscriptions,
            "disconnect",
            Value::String(reason.as_str().to_string()),
        )
        .await;
    subscriptions.detach();

    if reason == DisconnectReason::ServerDisconnect {
        let _ = close_tx.send(());
        if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task).await.is_err() {
            tracing::debug!(connection_id = %connection_id, "Close frame not flushed in time");
        }
    }
    send_task.abort();

    let duration = connection_start.elapsed().as_secs_f64();
    ConnectionMetrics::record_closed(duration);

    tracing::info!(
        connection_id = %connection_id,
        reason = reason.as_str(),
        duration_secs = duration,
        "Socket connection closed"
    );
}

/// Process a received WebSocket message.
/// Returns a reason when the session should end.
async fn process_message(
    msg: Message,
    state: &AppState,
    subscriptions: &Subscriptions,
) -> Option<DisconnectReason> {
    match msg {
        Message::Text(text) => {
            match parse_frame(text.as_str()) {
                Ok(frame) => {
                    state
                        .bridge
                        .fire(subscriptions, &frame.event, frame.data)
                        .await;
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %subscriptions.connection_id(),
                        error = %e,
                        "Failed to parse event frame"
                    );
                    BridgeMetrics::record_invalid_frame();
                    state
                        .bridge
                        .fire(subscriptions, "error", Value::String(e.to_string()))
                        .await;
                }
            }
            None
        }
        Message::Binary(_) => {
            tracing::warn!(
                connection_id = %subscriptions.connection_id(),
                "Binary frames are not supported, ignoring"
            );
            None
        }
        Message::Ping(_) => {
            // Axum answers pings itself
            state
                .bridge
                .fire(subscriptions, "ping", Value::Null)
                .await;
            None
        }
        Message::Pong(_) => None,
        Message::Close(_) => {
            tracing::debug!(connection_id = %subscriptions.connection_id(), "Received close frame");
            Some(DisconnectReason::ClientDisconnect)
        }
    }
}

fn parse_frame(text: &str) -> Result<EventFrame, serde_json::Error> {
    serde_json::from_str(text)
}
