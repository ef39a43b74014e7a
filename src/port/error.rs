//! Transport-level error types.
//!
//! Raised by [`Transport`](super::Transport) and
//! [`SerialHandle`](super::SerialHandle) implementations. The connection layer
//! never inspects these beyond wrapping them as the cause of an I/O failure.

use thiserror::Error;

/// Errors that can occur in a transport.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend rejected the requested line settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out at the OS level.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The handle was already released.
    #[error("Port handle is closed")]
    Closed,

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "Serial port not found: /dev/ttyUSB0");

        let err = PortError::config("1.5 stop bits are not supported");
        assert_eq!(
            err.to_string(),
            "Configuration error: 1.5 stop bits are not supported"
        );

        assert_eq!(PortError::Closed.to_string(), "Port handle is closed");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged");
        let err: PortError = io.into();
        assert!(matches!(err, PortError::Io(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    }
}
