mod app;
mod middleware;
mod state;

pub use app::{create_app, create_socket_app, socket_cors};
pub use middleware::api_key_auth;
pub use state::AppState;
