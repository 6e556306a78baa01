use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::bridge::InboundRecord;

use super::HostMessage;

/// Downstream consumer of inbound records.
///
/// The bridge awaits each delivery before handling the connection's next event.
#[async_trait]
pub trait InboundSink: Send + Sync {
    async fn deliver(&self, record: InboundRecord);
}

/// Publishes inbound records as host messages to any number of subscribers.
///
/// Records published while nobody is subscribed are dropped.
pub struct BroadcastSink {
    sender: broadcast::Sender<HostMessage>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl InboundSink for BroadcastSink {
    async fn deliver(&self, record: InboundRecord) {
        let connection_id = record.connection_id.clone();
        if self.sender.send(HostMessage::from(record)).is_err() {
            tracing::trace!(connection_id = %connection_id, "No pipeline subscribers, record dropped");
        }
    }
}

#[async_trait]
impl InboundSink for mpsc::UnboundedSender<InboundRecord> {
    async fn deliver(&self, record: InboundRecord) {
        if self.send(record).is_err() {
            tracing::debug!("Inbound record receiver closed");
        }
    }
}
