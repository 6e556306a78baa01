//! WebSocket transport: one JSON event frame per text message.

mod handler;
mod message;

pub use handler::{ws_handler, DisconnectReason};
pub use message::EventFrame;
