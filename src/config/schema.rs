//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::port::{ConnectionConfig, Timeouts};
use serde::Deserialize;
use std::collections::HashMap;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port defaults
    pub serial: SerialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values no connection could use.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid {
                key: "serial.baud_rate",
                reason: "baud rate must be positive",
            });
        }
        if matches!(&self.serial.default_port, Some(port) if port.is_empty()) {
            return Err(ConfigError::Invalid {
                key: "serial.default_port",
                reason: "port name must not be empty",
            });
        }
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port used when none is given on the command line
    pub default_port: Option<String>,
    /// Baud rate for new connections
    pub baud_rate: u32,
    /// Read and write timeout in milliseconds
    pub timeout_ms: u32,
    /// Close the port automatically when the connection is dropped
    pub auto_close: bool,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_port: None,
            baud_rate: ConnectionConfig::DEFAULT_BAUD_RATE,
            timeout_ms: 500,
            auto_close: true,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Connection parameters for `port` using these defaults: the configured
    /// baud rate, 8N1, no flow control, `timeout_ms` for reads and writes.
    pub fn connection_config(&self, port: &str) -> ConnectionConfig {
        ConnectionConfig {
            baud_rate: self.baud_rate,
            timeouts: Timeouts::simple(self.timeout_ms),
            ..ConnectionConfig::for_port(self.resolve_port(port))
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive, e.g. "info" or "serial_conn=trace"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}
