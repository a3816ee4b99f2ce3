use std::path::PathBuf;

/// Service configuration, read from `IPSEARCH_*` environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// City database (`IPSEARCH_CITY_DB`)
    pub city_db: PathBuf,
    /// ASN database (`IPSEARCH_ASN_DB`)
    pub asn_db: PathBuf,
    /// Address the HTTP listener binds (`IPSEARCH_LISTEN_ADDR`)
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            city_db: var("IPSEARCH_CITY_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("Data/GeoLite2-City.mmdb")),
            asn_db: var("IPSEARCH_ASN_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("Data/GeoLite2-ASN.mmdb")),
            listen_addr: var("IPSEARCH_LISTEN_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.city_db.as_os_str().is_empty() {
            return Err("IPSEARCH_CITY_DB cannot be empty".to_string());
        }

        if self.asn_db.as_os_str().is_empty() {
            return Err("IPSEARCH_ASN_DB cannot be empty".to_string());
        }

        // host:port, where host may be a name or a bracketed IPv6 literal
        match self.listen_addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
            _ => Err(format!(
                "IPSEARCH_LISTEN_ADDR must be host:port, got '{}'",
                self.listen_addr
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.city_db, PathBuf::from("Data/GeoLite2-City.mmdb"));
        assert_eq!(config.asn_db, PathBuf::from("Data/GeoLite2-ASN.mmdb"));
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("IPSEARCH_CITY_DB", "/srv/geo/city.mmdb"),
            ("IPSEARCH_LISTEN_ADDR", "[::1]:9000"),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::from_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.city_db, PathBuf::from("/srv/geo/city.mmdb"));
        assert_eq!(config.asn_db, PathBuf::from("Data/GeoLite2-ASN.mmdb"));
        assert_eq!(config.listen_addr, "[::1]:9000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_listen_addr() {
        for addr in ["", "8080", ":8080", "localhost:http", "0.0.0.0:70000"] {
            let config = ServerConfig {
                listen_addr: addr.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", addr);
        }
    }

    #[test]
    fn test_empty_db_path() {
        let config = ServerConfig {
            asn_db: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
