use anyhow::{Context, Result};
use ipsearch::{Database, IpVersion};
use serde_json::json;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::cli_utils::format_network;

pub fn cmd_query(database: PathBuf, ip: String, quiet: bool) -> Result<()> {
    let db = Database::open(&database)
        .with_context(|| format!("Failed to load database: {}", database.display()))?;

    let addr: IpAddr = ip
        .trim()
        .parse()
        .with_context(|| format!("Not an IP address: {}", ip))?;

    let result = db
        .lookup_ip(addr)
        .with_context(|| format!("Query failed for: {}", ip))?;

    if quiet {
        std::process::exit(if result.is_some() { 0 } else { 1 });
    }

    match result {
        Some(found) => {
            // Prefix lengths from an IPv4 tree are relative to the IPv4 form
            let shown = match addr {
                IpAddr::V6(v6) if db.ip_version() == IpVersion::V4 => {
                    v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(addr)
                }
                _ => addr,
            };
            let output = json!({
                "network": format_network(shown, found.prefix_len),
                "prefix_len": found.prefix_len,
                "data": found.data,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        None => {
            println!("null");
            std::process::exit(1);
        }
    }
}
