//! Network configuration
//!
//! Address and port shared by the server and the client. Defaults can be
//! overridden with `LINE_CHAT_HOST` and `LINE_CHAT_PORT`.

use std::env;

use crate::error::ConfigError;

/// Default host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port
pub const DEFAULT_PORT: u16 = 8187;

/// Environment variable overriding the host
pub const HOST_VAR: &str = "LINE_CHAT_HOST";

/// Environment variable overriding the port
pub const PORT_VAR: &str = "LINE_CHAT_PORT";

/// Where the server listens and the client dials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl NetworkConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_VAR).filter(|h| !h.is_empty()) {
            config.host = host;
        }

        if let Some(value) = lookup(PORT_VAR) {
            config.port = value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidPort { value, source })?;
        }

        Ok(config)
    }

    /// `host:port` string for binding or dialing
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
