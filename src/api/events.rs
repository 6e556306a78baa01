//! Server-Sent Events stream of inbound records.
//!
//! Each inbound record is sent as one `socketio` event whose data is the host message
//! JSON (`payload`, `socketIOEvent`, `socketIOId`, `socketIOStaticProperties`).
//! Subscribers that fall behind skip the records they missed.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::pipeline::HostMessage;
use crate::server::AppState;

const SSE_EVENT_NAME: &str = "socketio";
const KEEP_ALIVE_INTERVAL_SECS: u64 = 15;

/// GET /api/v1/events - Stream inbound records to the caller
#[tracing::instrument(name = "sse.events", skip(state))]
pub async fn inbound_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.pipeline.subscribe();
    tracing::info!(
        subscribers = state.pipeline.subscriber_count(),
        "Pipeline subscriber attached"
    );

    Sse::new(create_event_stream(receiver)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_INTERVAL_SECS))
            .text("keep-alive"),
    )
}

fn create_event_stream(
    mut receiver: broadcast::Receiver<HostMessage>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let started = std::time::Instant::now();

    async_stream::stream! {
        // Dropped when the client goes away and axum drops the stream
        let _guard = SubscriberGuard { started };

        loop {
            match receiver.recv().await {
                Ok(message) => yield Ok(to_event(&message)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Pipeline subscriber lagged, records dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

struct SubscriberGuard {
    started: std::time::Instant,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        tracing::info!(
            duration_secs = self.started.elapsed().as_secs_f64(),
            "Pipeline subscriber detached"
        );
    }
}

fn to_event(message: &HostMessage) -> Event {
    match serde_json::to_string(message) {
        Ok(json) => Event::default().event(SSE_EVENT_NAME).data(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize inbound record");
            Event::default()
                .event("error")
                .data(format!(r#"{{"code":"SERIALIZATION_ERROR","message":"{}"}}"#, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_stream_yields_published_records() {
        let (tx, rx) = broadcast::channel(8);
        let stream = create_event_stream(rx);
        futures::pin_mut!(stream);

        let message = HostMessage {
            payload: json!({"n": 1}),
            event: Some("chat".to_string()),
            ..Default::default()
        };
        tx.send(message).unwrap();
        drop(tx);

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_skips_lagged_records() {
        let (tx, rx) = broadcast::channel(1);
        let stream = create_event_stream(rx);
        futures::pin_mut!(stream);

        for n in 0..3 {
            tx.send(HostMessage {
                payload: json!(n),
                event: Some("tick".to_string()),
                ..Default::default()
            })
            .unwrap();
        }
        drop(tx);

        // Only the newest record survives a capacity-1 channel
        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }
}
