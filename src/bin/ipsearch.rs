mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::{cmd_inspect, cmd_query, cmd_serve};

#[derive(Parser)]
#[command(name = "ipsearch")]
#[command(
    about = "IP geolocation service backed by MaxMind DB files",
    long_about = "ipsearch - Locate IP addresses using MaxMind DB (MMDB) city and ASN databases\n\n\
    Serves a small HTTP API that answers where an address is, which network\n\
    announces it, and which language its country most likely speaks.\n\n\
    Examples:\n\
      ipsearch serve --listen 127.0.0.1:8080\n\
      ipsearch query Data/GeoLite2-City.mmdb 203.0.113.5\n\
      ipsearch inspect Data/GeoLite2-ASN.mmdb --json"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP locate service
    Serve {
        /// City database (overrides IPSEARCH_CITY_DB)
        #[arg(long, value_name = "FILE")]
        city_db: Option<PathBuf>,

        /// ASN database (overrides IPSEARCH_ASN_DB)
        #[arg(long, value_name = "FILE")]
        asn_db: Option<PathBuf>,

        /// Listen address (overrides IPSEARCH_LISTEN_ADDR)
        #[arg(short, long, value_name = "HOST:PORT")]
        listen: Option<String>,
    },

    /// Look up an IP address and print the raw record as JSON
    Query {
        /// Path to the database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// IPv4 or IPv6 address
        #[arg(value_name = "IP")]
        ip: String,

        /// Quiet mode: no output, only exit code (0 = found, 1 = not found)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print database metadata
    Inspect {
        /// Path to the database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve {
            city_db,
            asn_db,
            listen,
        } => cmd_serve(city_db, asn_db, listen),
        Commands::Query {
            database,
            ip,
            quiet,
        } => cmd_query(database, ip, quiet),
        Commands::Inspect { database, json } => cmd_inspect(database, json),
    }
}
