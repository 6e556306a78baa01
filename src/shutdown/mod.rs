//! Graceful shutdown handling for the socket bridge.
//!
//! 1. Signals background tasks and listeners to stop
//! 2. Disconnects every live connection and empties the registry
//! 3. Waits for the socket sessions to finish publishing their `disconnect` records

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::connection_manager::{ConnectionHandle, ConnectionRegistry};

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time to wait for socket sessions to wind down (default: 10 seconds)
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(10),
        }
    }
}

/// Handles graceful shutdown of the bridge
pub struct GracefulShutdown {
    registry: Arc<ConnectionRegistry>,
    shutdown_tx: broadcast::Sender<()>,
    config: ShutdownConfig,
}

impl GracefulShutdown {
    pub fn new(registry: Arc<ConnectionRegistry>, shutdown_tx: broadcast::Sender<()>) -> Self {
        Self::with_config(registry, shutdown_tx, ShutdownConfig::default())
    }

    pub fn with_config(
        registry: Arc<ConnectionRegistry>,
        shutdown_tx: broadcast::Sender<()>,
        config: ShutdownConfig,
    ) -> Self {
        Self {
            registry,
            shutdown_tx,
            config,
        }
    }

    /// Execute graceful shutdown sequence
    #[tracing::instrument(
        name = "graceful_shutdown",
        skip(self),
        fields(total_connections = self.registry.len())
    )]
    pub async fn execute(&self, reason: &str) -> ShutdownResult {
        let start = std::time::Instant::now();
        let mut result = ShutdownResult::default();

        tracing::info!(reason = %reason, "Starting graceful shutdown - Phase 1: Signaling tasks");
        let _ = self.shutdown_tx.send(());

        tracing::info!("Phase 2: Disconnecting sockets");
        let handles = self.registry.disconnect_all();
        result.connections_disconnected = handles.len();

        tracing::info!("Phase 3: Waiting for socket sessions to finish");
        result.sessions_finished = self.wait_for_sessions(&handles).await;

        result.duration = start.elapsed();
        result.success = result.sessions_finished == result.connections_disconnected;

        tracing::info!(
            connections_disconnected = result.connections_disconnected,
            sessions_finished = result.sessions_finished,
            duration_ms = result.duration.as_millis(),
            "Graceful shutdown completed"
        );

        result
    }

    /// A session is finished once its task has dropped its handle, leaving ours as the last one
    async fn wait_for_sessions(&self, handles: &[Arc<ConnectionHandle>]) -> usize {
        let finished = || handles.iter().filter(|h| Arc::strong_count(h) == 1).count();

        if handles.is_empty() {
            return 0;
        }

        let wait_future = async {
            while finished() < handles.len() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };

        if timeout(self.config.drain_timeout, wait_future).await.is_err() {
            tracing::warn!(
                remaining_sessions = handles.len() - finished(),
                "Some socket sessions did not finish in time"
            );
        }

        finished()
    }
}

/// Result of a graceful shutdown operation
#[derive(Debug, Default)]
pub struct ShutdownResult {
    pub success: bool,
    pub connections_disconnected: usize,
    /// Sessions whose socket task ended before the drain timeout
    pub sessions_finished: usize,
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_shutdown_no_connections() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, _) = broadcast::channel(1);
        let shutdown = GracefulShutdown::new(registry, tx);

        let result = shutdown.execute("test shutdown").await;

        assert!(result.success);
        assert_eq!(result.connections_disconnected, 0);
    }

    #[tokio::test]
    async fn test_shutdown_disconnects_and_signals() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (chan_tx, _chan_rx) = mpsc::channel(1);
        registry.register(Arc::new(ConnectionHandle::new("a", chan_tx)));
        let (tx, mut rx) = broadcast::channel(1);
        let shutdown = GracefulShutdown::new(registry.clone(), tx);

        let result = shutdown.execute("test shutdown").await;

        assert!(rx.recv().await.is_ok());
        assert!(registry.is_empty());
        assert_eq!(result.connections_disconnected, 1);
        assert_eq!(result.sessions_finished, 1);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_shutdown_times_out_on_live_session() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (chan_tx, _chan_rx) = mpsc::channel(1);
        let handle = Arc::new(ConnectionHandle::new("a", chan_tx));
        registry.register(handle.clone());
        let (tx, _) = broadcast::channel(1);
        let config = ShutdownConfig {
            drain_timeout: Duration::from_millis(100),
        };
        let shutdown = GracefulShutdown::with_config(registry, tx, config);

        // `handle` stands in for a session task that never ends
        let result = shutdown.execute("test shutdown").await;

        assert_eq!(result.sessions_finished, 0);
        assert!(!result.success);
        assert!(handle.is_closing());
    }

    #[test]
    fn test_shutdown_config_defaults() {
        let config = ShutdownConfig::default();
        assert_eq!(config.drain_timeout, Duration::from_secs(10));
    }
}
