mod settings;

pub use settings::{ApiConfig, BridgeConfig, LogConfig, OtelConfig, ServerConfig, Settings, SocketConfig};
