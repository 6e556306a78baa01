use axum::{http::Method, middleware, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{api_routes, service_routes};
use crate::config::SocketConfig;
use crate::websocket::ws_handler;

use super::{middleware::api_key_auth, AppState};

/// Router for the API listener. Carries the socket route too when `socket.bind_to_host` is set.
pub fn create_app(state: AppState) -> Router {
    let api = api_routes().layer(middleware::from_fn_with_state(state.clone(), api_key_auth));

    let mut app = Router::new().merge(service_routes()).nest("/api/v1", api);

    if state.settings.socket.bind_to_host {
        app = app.merge(socket_routes(&state.settings.socket));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Router for the dedicated socket listener
pub fn create_socket_app(state: AppState) -> Router {
    socket_routes(&state.settings.socket)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn socket_routes(config: &SocketConfig) -> Router<AppState> {
    let router = Router::new().route(&config.path, get(ws_handler));

    match socket_cors(config) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// CORS layer for the socket route, `None` when CORS is disabled
pub fn socket_cors(config: &SocketConfig) -> Option<CorsLayer> {
    if !config.enable_cors {
        return None;
    }

    let methods: Vec<Method> = config
        .cors_method_list()
        .iter()
        .filter_map(|m| match Method::from_bytes(m.as_bytes()) {
            Ok(method) => Some(method),
            Err(_) => {
                tracing::warn!(method = %m, "Ignoring invalid CORS method");
                None
            }
        })
        .collect();

    let origin = match config.cors_origin_list() {
        None => AllowOrigin::from(Any),
        Some(origins) => AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok())),
    };

    tracing::info!(
        origins = %config.cors_origins,
        methods = ?methods,
        "CORS enabled for socket route"
    );

    Some(CorsLayer::new().allow_origin(origin).allow_methods(methods))
}
