//! API layer - HTTP endpoints the pipeline talks to.

mod connection;
mod emit;
mod events;
mod health;
mod metrics;
mod rooms;
mod routes;

pub use connection::{get_properties, list_connections};
pub use emit::emit;
pub use events::inbound_events;
pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use rooms::{join_room, leave_room, list_rooms};
pub use routes::{api_routes, service_routes};
