//! HTTP server module for the booking service.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - Router configuration
//! - Graceful shutdown handling

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;

use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Serve `app` until Ctrl+C or SIGTERM, then give in-flight requests up to
/// `grace` to finish.
///
/// # Errors
///
/// Returns the I/O error if the server stops on its own.
pub async fn serve(listener: TcpListener, app: Router, grace: Duration) -> std::io::Result<()> {
    let (stop_tx, mut stop_rx) = watch::channel(());

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        // Either a stop request or the sender being dropped ends the wait.
        let _ = stop_rx.changed().await;
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server => {
            return joined.unwrap_or_else(|e| Err(std::io::Error::other(e)));
        }
        () = shutdown_signal() => {}
    }

    // Receiver lives inside the server task; a send error means it already stopped.
    let _ = stop_tx.send(());

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => joined.unwrap_or_else(|e| Err(std::io::Error::other(e))),
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out; dropping open connections");
            server.abort();
            Ok(())
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed, that signal is never reported and the
/// other one still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
