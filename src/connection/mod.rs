//! Serial connection lifecycle.
//!
//! [`SerialConnection`] owns at most one transport handle and moves between
//! two states:
//!
//! ```text
//!            open / open_with_timeout / open_raw / open_config
//!   Closed ───────────────────────────────────────────────────> Open
//!     ^                                                          │
//!     └────────────── close() or drop with auto-close ──────────┘
//! ```
//!
//! A failed open leaves the connection Closed. Every close attempt, failed or
//! not, leaves it Closed.

pub mod params;

pub use params::RawOpenParams;

use crate::call_site;
use crate::error::{CallSite, SerialError, SerialResult};
use crate::log::{LogLevel, LogRecord, Logger, CONNECTION_COMPONENT};
use crate::port::{ConnectionConfig, PortDescriptor, SerialHandle, SystemTransport, Transport};
use std::fmt;
use std::sync::Arc;

const NOT_OPEN: &str = "device is not open";
const ALREADY_OPEN: &str = "device is already open";

/// Whether a connection currently owns a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

/// A synchronous serial connection over a [`Transport`].
///
/// All operations block the calling thread for at most the configured
/// timeouts. Methods taking `&mut self` must not be called concurrently; wrap
/// the connection in a mutex or keep one connection per thread.
///
/// # Example
/// ```
/// use serial_conn::port::MockTransport;
/// use serial_conn::SerialConnection;
///
/// let mut connection = SerialConnection::new(MockTransport::new());
/// assert!(!connection.is_open());
///
/// connection.open("PORT1")?;
/// assert!(connection.is_open());
///
/// connection.close()?;
/// connection.close()?; // no-op
/// assert!(!connection.is_open());
/// # Ok::<(), serial_conn::SerialError>(())
/// ```
pub struct SerialConnection<T: Transport = SystemTransport> {
    transport: T,
    handle: Option<Box<dyn SerialHandle>>,
    config: Option<ConnectionConfig>,
    auto_close: bool,
    logger: Logger,
}

impl SerialConnection<SystemTransport> {
    /// Connection over the host's serial ports, auto-close enabled.
    pub fn system() -> Self {
        Self::new(SystemTransport::new())
    }
}

impl Default for SerialConnection<SystemTransport> {
    fn default() -> Self {
        Self::system()
    }
}

impl<T: Transport> SerialConnection<T> {
    /// Create a closed connection with auto-close enabled.
    pub fn new(transport: T) -> Self {
        Self::with_auto_close(transport, true)
    }

    /// Create a closed connection. With `auto_close` set, dropping the
    /// connection while open closes the handle and logs any failure.
    pub fn with_auto_close(transport: T, auto_close: bool) -> Self {
        Self {
            transport,
            handle: None,
            config: None,
            auto_close,
            logger: Logger::new(CONNECTION_COMPONENT),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    /// Install a log callback for this connection, replacing any previous one.
    pub fn set_log_function<F>(&mut self, sink: F)
    where
        F: Fn(&LogRecord<'_>) + Send + Sync + 'static,
    {
        self.logger.set_sink(Arc::new(sink));
    }

    pub fn is_set_log_function(&self) -> bool {
        self.logger.has_sink()
    }

    pub fn clear_log_function(&mut self) {
        self.logger.clear_sink();
    }

    /// Library version as `major.minor.patch`.
    pub fn version(&self) -> &'static str {
        crate::version()
    }

    /// List the serial ports available through the transport.
    pub fn list_ports(&self) -> SerialResult<Vec<PortDescriptor>> {
        let ports = self
            .transport
            .list_ports()
            .map_err(|e| self.fail(call_site!("list_ports"), SerialError::io(e)))?;

        for port in &ports {
            self.log(
                call_site!("list_ports"),
                LogLevel::Debug,
                &format!(
                    "found port '{}' ({}, {})",
                    port.port, port.description, port.hardware_id
                ),
            );
        }
        Ok(ports)
    }

    /// Open with every parameter given as a primitive value.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if a line-setting code is outside its legal set;
    ///   the transport is not contacted.
    /// - `IllegalState` if the connection is already open.
    /// - `IoFailure` if the transport cannot open the port.
    pub fn open_raw(&mut self, params: &RawOpenParams) -> SerialResult<()> {
        let config = ConnectionConfig::from_raw(params)
            .map_err(|e| self.fail(call_site!("open_raw"), e))?;
        self.open_config(config)
            .map_err(|e| e.at(call_site!("open_raw")))
    }

    /// Open at 9600 8N1 with `timeout_ms` for reads and writes.
    pub fn open_with_timeout(&mut self, port: &str, timeout_ms: u32) -> SerialResult<()> {
        self.open_config(ConnectionConfig::with_simple_timeout(port, timeout_ms))
            .map_err(|e| e.at(call_site!("open_with_timeout")))
    }

    /// Open at 9600 8N1 with all timeouts zero: reads return immediately
    /// with whatever data is already available.
    pub fn open(&mut self, port: &str) -> SerialResult<()> {
        self.open_config(ConnectionConfig::for_port(port))
            .map_err(|e| e.at(call_site!("open")))
    }

    /// Open with an already-typed configuration. All other open forms end
    /// up here.
    pub fn open_config(&mut self, config: ConnectionConfig) -> SerialResult<()> {
        self.open_canonical(config)
            .map_err(|e| self.fail(call_site!("open_config"), e))
    }

    fn open_canonical(&mut self, config: ConnectionConfig) -> SerialResult<()> {
        config.validate()?;
        if self.is_open() {
            return Err(SerialError::illegal_state(ALREADY_OPEN));
        }
        if let Some(stale) = self.handle.take() {
            let port = self.config.take().map(|previous| previous.port).unwrap_or_default();
            drop(stale);
            self.log(
                call_site!("open_config"),
                LogLevel::Debug,
                &format!("discarded released handle for '{port}'"),
            );
        }

        let handle = self
            .transport
            .open_handle(&config)
            .map_err(SerialError::io)?;

        self.log(
            call_site!("open_config"),
            LogLevel::Info,
            &format!(
                "opened '{}' at {} baud ({:?} data bits, {:?} parity, {:?} stop bits, {:?} flow control)",
                config.port,
                config.baud_rate,
                config.data_bits,
                config.parity,
                config.stop_bits,
                config.flow_control
            ),
        );
        self.handle = Some(handle);
        self.config = Some(config);
        Ok(())
    }

    /// `true` iff a handle is owned and reports itself open.
    pub fn is_open(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| handle.is_open())
    }

    pub fn state(&self) -> ConnectionState {
        match self.handle {
            Some(_) => ConnectionState::Open,
            None => ConnectionState::Closed,
        }
    }

    /// The configuration the current handle was opened with.
    pub fn config(&self) -> Option<&ConnectionConfig> {
        self.config.as_ref()
    }

    /// Release the handle. Closing a closed connection is a no-op.
    ///
    /// The connection is Closed afterwards even if the transport reports a
    /// failure, which is then returned.
    pub fn close(&mut self) -> SerialResult<()> {
        self.release()
            .map_err(|e| self.fail(call_site!("close"), e))
    }

    fn release(&mut self) -> SerialResult<()> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        let port = self.config.take().map(|config| config.port).unwrap_or_default();

        if !handle.is_open() {
            self.log(
                call_site!("close"),
                LogLevel::Debug,
                &format!("handle for '{port}' was already released"),
            );
            return Ok(());
        }

        handle.close().map_err(SerialError::io)?;
        self.log(
            call_site!("close"),
            LogLevel::Info,
            &format!("closed '{port}'"),
        );
        Ok(())
    }

    /// Write `bytes`, returning how many the transport accepted.
    ///
    /// A short count is not an error; callers needing full delivery must
    /// loop.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> SerialResult<usize> {
        let written = self
            .open_handle_mut()
            .and_then(|handle| handle.write(bytes).map_err(SerialError::io))
            .map_err(|e| self.fail(call_site!("write_bytes"), e))?;

        self.log(
            call_site!("write_bytes"),
            LogLevel::Verbose,
            &format!("wrote {written} of {} bytes", bytes.len()),
        );
        Ok(written)
    }

    /// Read up to `size` bytes. Fewer bytes, or none, means the configured
    /// timeout elapsed first.
    pub fn read_bytes(&mut self, size: usize) -> SerialResult<Vec<u8>> {
        let bytes = self
            .open_handle_mut()
            .and_then(|handle| handle.read(size).map_err(SerialError::io))
            .map_err(|e| self.fail(call_site!("read_bytes"), e))?;

        self.log(
            call_site!("read_bytes"),
            LogLevel::Verbose,
            &format!("read {} of {size} bytes", bytes.len()),
        );
        Ok(bytes)
    }

    fn open_handle_mut(&mut self) -> SerialResult<&mut (dyn SerialHandle + 'static)> {
        match self.handle.as_deref_mut() {
            Some(handle) if handle.is_open() => Ok(handle),
            _ => Err(SerialError::illegal_state(NOT_OPEN)),
        }
    }

    fn log(&self, site: CallSite, level: LogLevel, message: &str) {
        self.logger.log(site, level, message);
    }

    /// Log a failure and nest it under `site`.
    fn fail(&self, site: CallSite, error: SerialError) -> SerialError {
        self.log(site, LogLevel::Error, &error.report());
        error.at(site)
    }
}

impl<T: Transport> Drop for SerialConnection<T> {
    fn drop(&mut self) {
        if !self.auto_close || self.handle.is_none() {
            return;
        }
        if let Err(error) = self.release() {
            self.log(
                call_site!("drop"),
                LogLevel::Error,
                &format!("auto-close failed: {}", error.report()),
            );
        }
    }
}

impl<T: Transport> fmt::Debug for SerialConnection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialConnection")
            .field("state", &self.state())
            .field("config", &self.config)
            .field("auto_close", &self.auto_close)
            .field("logger", &self.logger)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::port::{MockTransport, PortError};
    use parking_lot::Mutex;

    fn capture(connection: &mut SerialConnection<MockTransport>) -> Arc<Mutex<Vec<(LogLevel, String)>>> {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&records);
        connection.set_log_function(move |record| {
            sink.lock().push((record.level, record.message.to_string()));
        });
        records
    }

    #[test]
    fn test_new_connection_is_closed() {
        let connection = SerialConnection::new(MockTransport::new());
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(!connection.is_open());
        assert!(connection.config().is_none());
        assert!(connection.auto_close());
        assert!(!connection.is_set_log_function());
    }

    #[test]
    fn test_open_records_config() {
        let mut connection = SerialConnection::new(MockTransport::new());
        connection.open_with_timeout("PORT1", 250).unwrap();

        assert_eq!(connection.state(), ConnectionState::Open);
        assert_eq!(
            connection.config(),
            Some(&ConnectionConfig::with_simple_timeout("PORT1", 250))
        );
    }

    #[test]
    fn test_open_twice_is_rejected_before_transport() {
        let transport = MockTransport::new();
        let mut connection = SerialConnection::new(transport.clone());
        connection.open("PORT1").unwrap();

        let err = connection.open("PORT2").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IllegalState(ALREADY_OPEN.into()));
        assert_eq!(transport.open_requests().len(), 1);
        assert_eq!(connection.config().map(|c| c.port.as_str()), Some("PORT1"));
    }

    #[test]
    fn test_nested_open_wraps_each_layer() {
        let transport = MockTransport::new();
        transport.fail_next_open(PortError::not_found("PORT9"));
        let mut connection = SerialConnection::new(transport);

        let err = connection.open("PORT9").unwrap_err();
        assert!(err.is_io_failure());
        assert!(err.message().starts_with("open(mod.rs:"));
        let links: Vec<String> = err.chain().map(|e| e.to_string()).collect();
        assert_eq!(links.len(), 4);
        assert!(links[1].starts_with("open_config(mod.rs:"));
        assert_eq!(links[2], "transport error");
        assert_eq!(links[3], "Serial port not found: PORT9");
    }

    #[test]
    fn test_close_skips_release_of_vanished_handle() {
        let transport = MockTransport::new();
        let mut connection = SerialConnection::new(transport.clone());
        connection.open("PORT1").unwrap();

        transport.set_disconnected(true);
        assert!(!connection.is_open());
        assert_eq!(connection.state(), ConnectionState::Open);

        connection.close().unwrap();
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert_eq!(transport.close_count(), 0);
    }

    #[test]
    fn test_close_failure_still_closes() {
        let transport = MockTransport::new();
        let mut connection = SerialConnection::new(transport.clone());
        connection.open("PORT1").unwrap();
        transport.fail_next_close(PortError::config("release refused"));

        let err = connection.close().unwrap_err();
        assert!(err.is_io_failure());
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(connection.close().is_ok());
        assert_eq!(transport.close_count(), 1);
    }

    #[test]
    fn test_log_records_lifecycle() {
        let transport = MockTransport::new();
        let mut connection = SerialConnection::new(transport);
        let records = capture(&mut connection);
        assert!(connection.is_set_log_function());

        connection.open("PORT1").unwrap();
        connection.write_bytes(b"ping").unwrap();
        connection.close().unwrap();

        let records = records.lock();
        assert!(records
            .iter()
            .any(|(level, msg)| *level == LogLevel::Info && msg.starts_with("opened 'PORT1'")));
        assert!(records
            .iter()
            .any(|(level, msg)| *level == LogLevel::Verbose && msg == "wrote 4 of 4 bytes"));
        assert!(records
            .iter()
            .any(|(level, msg)| *level == LogLevel::Info && msg == "closed 'PORT1'"));
    }

    #[test]
    fn test_failures_are_logged_once() {
        let mut connection = SerialConnection::new(MockTransport::new());
        let records = capture(&mut connection);

        let _ = connection.read_bytes(1);

        let records = records.lock();
        let errors: Vec<_> = records
            .iter()
            .filter(|(level, _)| *level == LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].1, NOT_OPEN);
    }

    #[test]
    fn test_clear_log_function() {
        let mut connection = SerialConnection::new(MockTransport::new());
        let _records = capture(&mut connection);
        connection.clear_log_function();
        assert!(!connection.is_set_log_function());
    }

    #[test]
    fn test_version_matches_package() {
        let connection = SerialConnection::new(MockTransport::new());
        assert_eq!(connection.version(), env!("CARGO_PKG_VERSION"));
        assert_eq!(connection.version().split('.').count(), 3);
    }
}
