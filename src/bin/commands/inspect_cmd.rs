use anyhow::{Context, Result};
use ipsearch::Database;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::format_unix_timestamp;

pub fn cmd_inspect(database: PathBuf, json_output: bool) -> Result<()> {
    let db = Database::open(&database)
        .with_context(|| format!("Failed to load database: {}", database.display()))?;
    let metadata = db.metadata();

    if json_output {
        let output = json!({
            "file": database.display().to_string(),
            "size": db.size(),
            "metadata": metadata,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Database:      {}", database.display());
    println!("Size:          {} bytes", db.size());
    if !metadata.database_type.is_empty() {
        println!("Type:          {}", metadata.database_type);
    }
    println!(
        "Format:        v{}.{}",
        metadata.binary_format_major_version, metadata.binary_format_minor_version
    );
    println!("IP version:    {}", metadata.ip_version);
    println!("Record size:   {} bits", metadata.record_size);
    println!("Nodes:         {}", metadata.node_count);
    if metadata.build_epoch > 0 {
        println!("Built:         {}", format_unix_timestamp(metadata.build_epoch));
    }
    if !metadata.languages.is_empty() {
        println!("Languages:     {}", metadata.languages.join(", "));
    }
    for (lang, text) in &metadata.description {
        println!("Description:   [{}] {}", lang, text);
    }

    Ok(())
}
