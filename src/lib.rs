//! Serial Connection Library
//!
//! A uniform, fail-safe layer over the host's serial ports: enumerate ports,
//! open one with fully specified line settings, move raw bytes with timeout
//! semantics, and release the OS handle deterministically.
//!
//! # Modules
//!
//! - `connection`: [`SerialConnection`] lifecycle, open-form normalization and byte I/O
//! - `port`: the [`Transport`](port::Transport) capability plus system and mock implementations
//! - `error`: Structured, chainable [`SerialError`]
//! - `log`: Optional per-connection log sink, mirrored to `tracing`
//! - `config`: TOML configuration with environment overrides (used by the CLI)
//!
//! # Example
//!
//! ```no_run
//! use serial_conn::SerialConnection;
//!
//! let mut serial = SerialConnection::system();
//! for port in serial.list_ports()? {
//!     println!("{} - {} - {}", port.port, port.description, port.hardware_id);
//! }
//!
//! serial.open_with_timeout("/dev/ttyACM0", 500)?;
//! let sent = serial.write_bytes(b"hello")?;
//! let echoed = serial.read_bytes(sent)?;
//! serial.close()?;
//! # let _ = echoed;
//! # Ok::<(), serial_conn::SerialError>(())
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod log;
pub mod port;

// Re-export commonly used types for convenience
pub use connection::{ConnectionState, RawOpenParams, SerialConnection};
pub use error::{CallSite, ErrorKind, SerialError, SerialResult};
pub use log::{LogLevel, LogRecord, LogSink};
pub use port::{
    ConnectionConfig, DataBits, FlowControl, Parity, PortDescriptor, PortError, StopBits,
    Timeouts,
};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};

/// Library version as `major.minor.patch`.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
