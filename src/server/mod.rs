//! HTTP service
//!
//! Exposes the city and ASN readers over HTTP:
//!
//! - `GET /?ip=<addr>&callback=<fn>` locate an address (JSON or JSONP)
//! - `GET /health` liveness and database status

mod client_ip;
mod config;
mod handlers;

pub use client_ip::resolve_client_ip;
pub use config::ServerConfig;
pub use handlers::{health_handler, is_valid_callback, locate_handler, LocateQuery};

use crate::error::Result;
use crate::reader::GeoReader;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Application state container
pub struct AppState {
    /// City database reader
    pub city: Arc<GeoReader>,
    /// ASN database reader
    pub asn: Arc<GeoReader>,
}

impl AppState {
    /// Open both databases named in `config`
    ///
    /// Fails if either database cannot be opened; the service does not start
    /// half-configured.
    pub fn open(config: &ServerConfig) -> Result<Self> {
        Ok(AppState {
            city: Arc::new(GeoReader::open("city", &config.city_db)?),
            asn: Arc::new(GeoReader::open("asn", &config.asn_db)?),
        })
    }

    /// Close both databases
    pub fn close(&self) {
        self.city.close();
        self.asn.close();
    }
}

/// Create router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(locate_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve until Ctrl-C, then close the databases
pub async fn serve(listen_addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    let app = create_router(Arc::clone(&state));
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!(
        city_anomalies = state.city.anomalies(),
        asn_anomalies = state.asn.anomalies(),
        "Shutting down"
    );
    state.close();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
