//! In-memory transport for testing.
//!
//! Provides a [`MockTransport`] that simulates a serial backend without
//! requiring actual hardware. Clones share state, so a test can keep one
//! clone for inspection after moving another into a
//! [`SerialConnection`](crate::SerialConnection).

use super::error::PortError;
use super::traits::{ConnectionConfig, PortDescriptor, SerialHandle, Transport};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Inner state shared by a mock transport and every handle it opened.
#[derive(Debug, Default)]
struct MockState {
    /// Ports reported by `list_ports`.
    ports: Vec<PortDescriptor>,
    /// Bytes handed out by reads, in order.
    read_queue: VecDeque<u8>,
    /// Every accepted write, one entry per call.
    write_log: Vec<Vec<u8>>,
    /// Maximum bytes accepted per write call.
    write_limit: Option<usize>,
    /// Configurations passed to `open_handle`, successful or not.
    open_requests: Vec<ConnectionConfig>,
    open_count: usize,
    close_count: usize,
    read_calls: usize,
    write_calls: usize,
    /// Simulates the device vanishing underneath an open handle.
    disconnected: bool,
    fail_list: Option<PortError>,
    fail_open: Option<PortError>,
    fail_close: Option<PortError>,
    fail_read: Option<PortError>,
    fail_write: Option<PortError>,
}

/// Mock transport implementation for testing.
///
/// This implementation allows you to:
/// - Advertise a fixed list of ports
/// - Enqueue data to be returned by read operations
/// - Inspect what data was written and how handles were opened and closed
/// - Cap how many bytes a write accepts
/// - Inject one-shot failures into any operation
///
/// # Example
/// ```
/// use serial_conn::port::MockTransport;
/// use serial_conn::SerialConnection;
///
/// let transport = MockTransport::new();
/// transport.enqueue_read(b"HELLO");
///
/// let mut connection = SerialConnection::new(transport.clone());
/// connection.open_with_timeout("PORT1", 500).unwrap();
/// assert_eq!(connection.write_bytes(b"hello").unwrap(), 5);
/// assert_eq!(connection.read_bytes(5).unwrap(), b"HELLO");
/// connection.close().unwrap();
///
/// assert_eq!(transport.write_log(), vec![b"hello".to_vec()]);
/// assert_eq!(transport.close_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport advertising the given ports.
    pub fn with_ports(ports: impl IntoIterator<Item = PortDescriptor>) -> Self {
        let transport = Self::new();
        transport.state.lock().ports.extend(ports);
        transport
    }

    /// Enqueue bytes to be returned by subsequent reads.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Number of bytes still waiting to be read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Accept at most `limit` bytes per write call.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.state.lock().write_limit = limit;
    }

    /// Get a copy of all data written so far, one entry per write call.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Configurations that were passed to `open_handle`.
    pub fn open_requests(&self) -> Vec<ConnectionConfig> {
        self.state.lock().open_requests.clone()
    }

    /// The most recent configuration passed to `open_handle`.
    pub fn last_open_request(&self) -> Option<ConnectionConfig> {
        self.state.lock().open_requests.last().cloned()
    }

    /// Number of handles successfully opened.
    pub fn open_count(&self) -> usize {
        self.state.lock().open_count
    }

    /// Number of `close` calls received by handles, failed ones included.
    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }

    pub fn read_calls(&self) -> usize {
        self.state.lock().read_calls
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().write_calls
    }

    /// Make open handles report themselves closed, as if unplugged.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.state.lock().disconnected = disconnected;
    }

    /// Fail the next `list_ports` call with `error`.
    pub fn fail_next_list(&self, error: PortError) {
        self.state.lock().fail_list = Some(error);
    }

    /// Fail the next `open_handle` call with `error`.
    pub fn fail_next_open(&self, error: PortError) {
        self.state.lock().fail_open = Some(error);
    }

    /// Fail the next handle `close` with `error`.
    pub fn fail_next_close(&self, error: PortError) {
        self.state.lock().fail_close = Some(error);
    }

    /// Fail the next handle `read` with `error`.
    pub fn fail_next_read(&self, error: PortError) {
        self.state.lock().fail_read = Some(error);
    }

    /// Fail the next handle `write` with `error`.
    pub fn fail_next_write(&self, error: PortError) {
        self.state.lock().fail_write = Some(error);
    }
}

impl Transport for MockTransport {
    fn list_ports(&self) -> Result<Vec<PortDescriptor>, PortError> {
        let mut state = self.state.lock();
        if let Some(error) = state.fail_list.take() {
            return Err(error);
        }
        Ok(state.ports.clone())
    }

    fn open_handle(&self, config: &ConnectionConfig) -> Result<Box<dyn SerialHandle>, PortError> {
        let mut state = self.state.lock();
        state.open_requests.push(config.clone());
        if let Some(error) = state.fail_open.take() {
            return Err(error);
        }
        state.open_count += 1;
        state.disconnected = false;

        Ok(Box::new(MockHandle {
            name: config.port.clone(),
            open: true,
            state: Arc::clone(&self.state),
        }))
    }
}

/// Handle produced by [`MockTransport`].
pub struct MockHandle {
    name: String,
    open: bool,
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SerialHandle for MockHandle {
    fn is_open(&self) -> bool {
        self.open && !self.state.lock().disconnected
    }

    fn close(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.close_count += 1;
        // The handle counts as released even when the backend reports failure.
        self.open = false;
        match state.fail_close.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        if !self.open {
            return Err(PortError::Closed);
        }
        let mut state = self.state.lock();
        state.write_calls += 1;
        if let Some(error) = state.fail_write.take() {
            return Err(error);
        }

        let accepted = state.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        state.write_log.push(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn read(&mut self, max: usize) -> Result<Vec<u8>, PortError> {
        if !self.open {
            return Err(PortError::Closed);
        }
        let mut state = self.state.lock();
        state.read_calls += 1;
        if let Some(error) = state.fail_read.take() {
            return Err(error);
        }

        let count = max.min(state.read_queue.len());
        Ok(state.read_queue.drain(..count).collect())
    }
}

impl std::fmt::Debug for MockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHandle")
            .field("name", &self.name)
            .field("open", &self.open)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(transport: &MockTransport) -> Box<dyn SerialHandle> {
        transport
            .open_handle(&ConnectionConfig::for_port("MOCK0"))
            .unwrap()
    }

    #[test]
    fn test_enqueue_and_read() {
        let transport = MockTransport::new();
        transport.enqueue_read(b"Hello");
        let mut handle = open(&transport);

        assert_eq!(handle.read(10).unwrap(), b"Hello");
        assert!(handle.read(10).unwrap().is_empty());
    }

    #[test]
    fn test_partial_read() {
        let transport = MockTransport::new();
        transport.enqueue_read(b"Hello, World!");
        let mut handle = open(&transport);

        assert_eq!(handle.read(5).unwrap(), b"Hello");
        assert_eq!(transport.available_bytes(), 8);
    }

    #[test]
    fn test_write_logging_and_limit() {
        let transport = MockTransport::new();
        let mut handle = open(&transport);

        assert_eq!(handle.write(b"Test1").unwrap(), 5);
        transport.set_write_limit(Some(2));
        assert_eq!(handle.write(b"Test2").unwrap(), 2);

        assert_eq!(transport.write_log(), vec![b"Test1".to_vec(), b"Te".to_vec()]);
        assert_eq!(transport.write_calls(), 2);
    }

    #[test]
    fn test_one_shot_failures() {
        let transport = MockTransport::new();
        transport.fail_next_open(PortError::not_found("MOCK0"));

        assert!(matches!(
            transport.open_handle(&ConnectionConfig::for_port("MOCK0")),
            Err(PortError::NotFound(_))
        ));
        assert_eq!(transport.open_count(), 0);
        assert_eq!(transport.open_requests().len(), 1);

        let mut handle = open(&transport);
        transport.fail_next_read(PortError::timeout(std::time::Duration::from_millis(5)));
        assert!(matches!(handle.read(1), Err(PortError::Timeout(_))));
        assert!(handle.read(1).is_ok());
    }

    #[test]
    fn test_close_marks_handle_closed_even_on_failure() {
        let transport = MockTransport::new();
        let mut handle = open(&transport);
        transport.fail_next_close(PortError::config("stuck"));

        assert!(handle.close().is_err());
        assert!(!handle.is_open());
        assert_eq!(transport.close_count(), 1);
        assert!(matches!(handle.write(b"x"), Err(PortError::Closed)));
    }

    #[test]
    fn test_disconnect_reports_not_open() {
        let transport = MockTransport::new();
        let handle = open(&transport);
        assert!(handle.is_open());

        transport.set_disconnected(true);
        assert!(!handle.is_open());
    }

    #[test]
    fn test_list_ports() {
        let transport = MockTransport::with_ports([PortDescriptor::new("COM1", "Port 1", "n/a")]);
        assert_eq!(transport.list_ports().unwrap().len(), 1);

        transport.fail_next_list(PortError::config("enumeration failed"));
        assert!(transport.list_ports().is_err());
    }
}
