use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use socket_bridge::config::Settings;
use socket_bridge::server::{create_app, create_socket_app, AppState};
use socket_bridge::shutdown::GracefulShutdown;
use socket_bridge::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing; the guard flushes spans when main returns
    let telemetry = init_telemetry(&settings.log, &settings.otel)?;
    tracing::info!(span_export = telemetry.exporting(), "Configuration loaded");

    let state = AppState::new(settings.clone());
    tracing::info!(rules = ?settings.bridge.rules, "Application state initialized");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let shutdown = GracefulShutdown::new(state.registry.clone(), shutdown_tx.clone());

    // Dedicated socket listener unless the socket route shares the API port
    let socket_handle = if settings.socket.bind_to_host {
        tracing::info!(path = %settings.socket.path, "Socket route bound to API listener");
        None
    } else {
        let addr = settings.socket_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(path = %settings.socket.path, "Socket listener on {}", addr);

        let app = create_socket_app(state.clone());
        let mut shutdown_rx = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            });
            if let Err(e) = serve.await {
                tracing::error!(error = %e, "Socket listener failed");
            }
        }))
    };

    let app = create_app(state);
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Sockets are closed before the listeners stop accepting
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let reason = shutdown_signal().await;
            shutdown.execute(reason).await;
        })
        .await?;

    if let Some(handle) = socket_handle {
        tracing::info!("Waiting for socket listener to finish...");
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
            "ctrl_c"
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
            "sigterm"
        }
    }
}
