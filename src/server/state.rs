use std::sync::Arc;
use std::time::Instant;

use crate::bridge::EventBridge;
use crate::config::Settings;
use crate::connection_manager::ConnectionRegistry;
use crate::pipeline::BroadcastSink;
use crate::rooms::RoomMembership;
use crate::router::OutboundRouter;

/// Capacity of the inbound record fan-out channel
const PIPELINE_BUFFER_SIZE: usize = 1024;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<ConnectionRegistry>,
    pub bridge: Arc<EventBridge>,
    pub router: Arc<OutboundRouter>,
    pub rooms: Arc<RoomMembership>,
    pub pipeline: Arc<BroadcastSink>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let pipeline = Arc::new(BroadcastSink::new(PIPELINE_BUFFER_SIZE));
        let bridge = Arc::new(EventBridge::new(
            settings.bridge.rules.clone(),
            registry.clone(),
            pipeline.clone(),
        ));
        let router = Arc::new(OutboundRouter::new(registry.clone()));
        let rooms = Arc::new(RoomMembership::new(registry.clone()));

        Self {
            settings: Arc::new(settings),
            registry,
            bridge,
            router,
            rooms,
            pipeline,
            start_time: Instant::now(),
        }
    }
}
