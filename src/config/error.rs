//! Failures while resolving the CLI configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The resolved config file exists but could not be read.
    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but no connection could use it.
    #[error("{key}: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },

    /// A `SERIAL_CONN_*` override did not parse.
    #[error("{var}={value:?} is not a valid {expected}")]
    Env {
        var: String,
        value: String,
        expected: &'static str,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
