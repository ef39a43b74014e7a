//! Configuration for the `serial-conn` command-line tool.
//!
//! The library itself takes every parameter explicitly; this module only
//! supplies defaults for the binary.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_CONN_CONFIG` environment variable (explicit path)
//! 2. `./serial-conn.toml` (current directory)
//! 3. The platform config directory, e.g. `~/.config/serial-conn/serial-conn.toml`
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `SERIAL_CONN_SERIAL_PORT=/dev/ttyACM0`
//! - `SERIAL_CONN_SERIAL_BAUD_RATE=115200`
//! - `SERIAL_CONN_SERIAL_TIMEOUT_MS=500`
//! - `SERIAL_CONN_SERIAL_AUTO_CLOSE=false`
//! - `SERIAL_CONN_LOG_LEVEL=debug`
//! - `SERIAL_CONN_LOG_FORMAT=json`
//!
//! # Example
//!
//! ```rust,ignore
//! use serial_conn::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! println!("Default timeout: {} ms", config.serial.timeout_ms);
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig};
