use serde::Serialize;
use serde_json::Value;

use crate::connection_manager::Properties;

/// Events subscribed on every connection regardless of configured rules
pub const LIFECYCLE_EVENTS: [&str; 12] = [
    // Manager events
    "open",
    "error",
    "close",
    "ping",
    "packet",
    "reconnect_attempt",
    "reconnect",
    "reconnect_error",
    "reconnect_failed",
    // Socket events
    "connect",
    "connect_error",
    "disconnect",
];

/// An inbound protocol event, as handed to the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundRecord {
    pub payload: Value,
    pub event: String,
    pub connection_id: String,
    /// Custom properties of the connection at delivery time
    pub static_properties: Option<Properties>,
}

/// Per-connection subscription table.
///
/// Built once when the connection is attached and emptied on detach; firing an event
/// against a detached table delivers nothing.
#[derive(Debug, Clone)]
pub struct Subscriptions {
    connection_id: String,
    events: Vec<String>,
}

impl Subscriptions {
    pub(super) fn new(connection_id: String, events: Vec<String>) -> Self {
        Self {
            connection_id,
            events,
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Number of table entries subscribed to `event`
    pub fn matching(&self, event: &str) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn detach(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_counts_duplicates() {
        let subs = Subscriptions::new(
            "a".into(),
            vec!["chat".into(), "connect".into(), "connect".into()],
        );
        assert_eq!(subs.matching("chat"), 1);
        assert_eq!(subs.matching("connect"), 2);
        assert_eq!(subs.matching("other"), 0);
    }

    #[test]
    fn test_detach_empties_table() {
        let mut subs = Subscriptions::new("a".into(), vec!["chat".into()]);
        assert_eq!(subs.matching("chat"), 1);
        subs.detach();
        assert!(subs.events().is_empty());
        assert_eq!(subs.matching("chat"), 0);
    }
}
