//! Server and storage settings read from the environment

use std::env;
use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;

use bp_tracker_domain::config::ConfigError;

/// Where the record store persists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// SQLite file (durable)
    Sqlite,
    /// Process memory (lost on exit)
    Memory,
}

impl StorageBackend {
    /// `STORAGE_BACKEND`, default `sqlite`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(env::var("STORAGE_BACKEND").ok().as_deref())
    }

    pub fn parse(value: Option<&str>) -> Result<Self, ConfigError> {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("sqlite") => Ok(StorageBackend::Sqlite),
            Some("memory") => Ok(StorageBackend::Memory),
            Some(other) => Err(ConfigError::InvalidValue {
                name: "STORAGE_BACKEND".to_string(),
                reason: format!("unknown backend '{}', expected sqlite or memory", other),
            }),
        }
    }
}

/// Listen address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Browser origins allowed to call the API cross-origin. Empty means
    /// no CORS headers are sent at all.
    pub allowed_origins: Vec<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `HOST` (default 127.0.0.1), `PORT` (default 3000) and
    /// `ALLOWED_ORIGINS` (comma-separated, default none)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = match env::var("HOST") {
            Ok(raw) => raw.trim().parse::<IpAddr>().map_err(|e| ConfigError::InvalidValue {
                name: "HOST".to_string(),
                reason: e.to_string(),
            })?,
            Err(_) => defaults.host,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: "PORT".to_string(),
                reason: e.to_string(),
            })?,
            Err(_) => defaults.port,
        };

        let allowed_origins = parse_origins(env::var("ALLOWED_ORIGINS").ok().as_deref())?;

        Ok(Self {
            host,
            port,
            allowed_origins,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Split a comma-separated origin list. Wildcards are refused.
pub fn parse_origins(value: Option<&str>) -> Result<Vec<HeaderValue>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        name: "ALLOWED_ORIGINS".to_string(),
        reason,
    };

    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            if origin == "*" {
                return Err(invalid("wildcard origin is not allowed".to_string()));
            }
            HeaderValue::from_str(origin).map_err(|e| invalid(format!("'{}': {}", origin, e)))
        })
        .collect()
}
