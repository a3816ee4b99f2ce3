use anyhow::{Context, Result};
use ipsearch::server::{serve, AppState, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub fn cmd_serve(
    city_db: Option<PathBuf>,
    asn_db: Option<PathBuf>,
    listen: Option<String>,
) -> Result<()> {
    let mut config = ServerConfig::from_env();
    if let Some(path) = city_db {
        config.city_db = path;
    }
    if let Some(path) = asn_db {
        config.asn_db = path;
    }
    if let Some(addr) = listen {
        config.listen_addr = addr;
    }
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        city_db = %config.city_db.display(),
        asn_db = %config.asn_db.display(),
        "Configuration loaded and validated"
    );

    let state = AppState::open(&config).context("Failed to open geo databases")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(serve(&config.listen_addr, Arc::new(state)))
        .with_context(|| format!("Server on {} failed", config.listen_addr))?;

    Ok(())
}
