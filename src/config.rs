//! Environment-driven server configuration.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SERVER_HOST` | `127.0.0.1` |
//! | `SERVER_PORT` | `8080` |
//! | `ORDER_TX_MAX_RETRIES` | `5` |
//! | `ORDER_TX_BACKOFF_MS` | `5` |
//! | `ORDER_TX_MAX_BACKOFF_MS` | `1000` |
//! | `ORDER_TX_TIMEOUT_MS` | unset (no timeout) |

use crate::error::{Error, Result};
use crate::store::TransactionConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server settings plus the transaction defaults used by the order workflow.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub transaction: TransactionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            transaction: TransactionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from process environment, falling back to defaults for unset variables.
    ///
    /// # Errors
    /// `Error::ConfigError` when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let host = lookup("SERVER_HOST").unwrap_or(defaults.host);
        let port = parse_var::<u16, _>(&lookup, "SERVER_PORT")?.unwrap_or(defaults.port);

        let mut transaction = defaults.transaction;
        if let Some(retries) = parse_var::<u32, _>(&lookup, "ORDER_TX_MAX_RETRIES")? {
            transaction = transaction.with_retry(retries);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "ORDER_TX_BACKOFF_MS")? {
            transaction = transaction.with_backoff(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "ORDER_TX_MAX_BACKOFF_MS")? {
            transaction = transaction.with_max_backoff(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "ORDER_TX_TIMEOUT_MS")? {
            if ms == 0 {
                return Err(Error::ConfigError(
                    "ORDER_TX_TIMEOUT_MS must be greater than zero".to_string(),
                ));
            }
            transaction = transaction.with_timeout(Duration::from_millis(ms));
        }

        Ok(ServerConfig {
            host,
            port,
            transaction,
        })
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| {
            Error::ConfigError(format!("invalid value {:?} for {}: {}", raw, name, e))
        }),
    }
}
