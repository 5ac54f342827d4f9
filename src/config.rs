use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_IDENTITY_FILE: &str = ".habitos_identity.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL missing"))?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| {
            let port = lookup("PORT").unwrap_or_else(|| "8000".to_string());
            format!("0.0.0.0:{}", port)
        });
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {raw}"))?,
            None => 10,
        };
        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
        })
    }
}

/// Settings for the terminal client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub identity_path: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("HABITOS_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = match lookup("HABITOS_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("HABITOS_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(anyhow!("HABITOS_TIMEOUT_SECS must be greater than zero"));
        }
        let identity_path = lookup("HABITOS_IDENTITY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IDENTITY_FILE));

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            identity_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_server_requires_database_url() {
        assert!(ServerConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_server_bind_addr_falls_back_to_port() {
        let config = ServerConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("PORT", "9000")])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.max_connections, 10);

        let config = ServerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("BIND_ADDR", "127.0.0.1:7000"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:7000");
    }

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.identity_path, PathBuf::from(DEFAULT_IDENTITY_FILE));
    }

    #[test]
    fn test_client_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("HABITOS_API_URL", "https://habits.example.com/"),
            ("HABITOS_TIMEOUT_SECS", "3"),
            ("HABITOS_IDENTITY_PATH", "/tmp/id.json"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://habits.example.com");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.identity_path, PathBuf::from("/tmp/id.json"));
    }

    #[test]
    fn test_client_rejects_bad_timeout() {
        assert!(ClientConfig::from_lookup(lookup(&[("HABITOS_TIMEOUT_SECS", "soon")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("HABITOS_TIMEOUT_SECS", "0")])).is_err());
    }
}
