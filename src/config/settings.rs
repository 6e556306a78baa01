use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub socket: SocketConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

/// HTTP API listener (the host pipeline side)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

/// Socket server settings
#[derive(Debug, Clone, Deserialize)]
pub struct SocketConfig {
    /// Port for the dedicated socket listener (ignored when `bind_to_host` is set)
    #[serde(default = "default_socket_port")]
    pub port: u16,
    /// Route the WebSocket endpoint is mounted on
    #[serde(default = "default_socket_path")]
    pub path: String,
    /// Mount the socket endpoint on the API listener instead of a listener of its own
    #[serde(default)]
    pub bind_to_host: bool,
    #[serde(default)]
    pub enable_cors: bool,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    /// Comma separated list, e.g. `GET,POST`
    #[serde(default = "default_cors_methods")]
    pub cors_methods: String,
    /// Capacity of each connection's outbound queue
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

/// Inbound event subscription settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeConfig {
    /// Event names subscribed on every connection in addition to the lifecycle events
    #[serde(default)]
    pub rules: Vec<String>,
}

/// Pipeline API access
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// When set, `/api/v1` requests must carry it in `X-API-Key`
    pub key: Option<String>,
}

/// Console log output
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// One JSON object per line instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    1880
}

fn default_socket_port() -> u16 {
    80
}

fn default_socket_path() -> String {
    "/socket.io".to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_cors_methods() -> String {
    "GET,POST".to_string()
}

fn default_channel_buffer() -> usize {
    32
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "socket-bridge".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 1880)?
            .set_default("socket.port", 80)?
            .set_default("socket.path", "/socket.io")?
            .set_default("socket.bind_to_host", false)?
            .set_default("socket.enable_cors", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER__PORT, SOCKET__BIND_TO_HOST, BRIDGE__RULES=chat,typing, OTEL__ENABLED, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("bridge.rules"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.socket.port)
    }
}

impl SocketConfig {
    /// CORS methods, upper-cased and split on commas
    pub fn cors_method_list(&self) -> Vec<String> {
        self.cors_methods
            .to_uppercase()
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect()
    }

    /// `None` means any origin
    pub fn cors_origin_list(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            socket: SocketConfig::default(),
            bridge: BridgeConfig::default(),
            api: ApiConfig::default(),
            log: LogConfig::default(),
            otel: OtelConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_api_port(),
        }
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            port: default_socket_port(),
            path: default_socket_path(),
            bind_to_host: false,
            enable_cors: false,
            cors_origins: default_cors_origins(),
            cors_methods: default_cors_methods(),
            channel_buffer: default_channel_buffer(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
