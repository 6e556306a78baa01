// Shared components
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Core bridge
pub mod bridge;
pub mod connection_manager;
pub mod pipeline;
pub mod rooms;
pub mod router;

// Application layer
pub mod api;
pub mod server;
pub mod websocket;

// Supporting modules
pub mod shutdown;
