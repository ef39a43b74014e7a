//! Shared test utilities for serial connection tests.
//!
//! - Connections over a [`MockTransport`] with a shared inspection handle
//! - A capturing log sink
//! - Port descriptor builders

#![allow(dead_code)]

use parking_lot::Mutex;
use serial_conn::port::MockTransport;
use serial_conn::{LogLevel, PortDescriptor, SerialConnection};
use std::sync::Arc;

/// A log record copied out of the sink callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    pub level: LogLevel,
    pub component: String,
    pub function: String,
    pub message: String,
}

pub type CapturedLog = Arc<Mutex<Vec<CapturedRecord>>>;

/// Create a connection plus a clone of its transport for inspection.
pub fn mock_connection() -> (SerialConnection<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    (SerialConnection::new(transport.clone()), transport)
}

/// Create a connection whose transport answers every read with `reply`.
pub fn mock_connection_with_reply(reply: &[u8]) -> (SerialConnection<MockTransport>, MockTransport) {
    let (connection, transport) = mock_connection();
    transport.enqueue_read(reply);
    (connection, transport)
}

/// Install a sink that records every log event.
pub fn capture_log(connection: &mut SerialConnection<MockTransport>) -> CapturedLog {
    let log: CapturedLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    connection.set_log_function(move |record| {
        sink.lock().push(CapturedRecord {
            level: record.level,
            component: record.component.to_string(),
            function: record.function.to_string(),
            message: record.message.to_string(),
        });
    });
    log
}

/// Messages captured at `level`.
pub fn messages_at(log: &CapturedLog, level: LogLevel) -> Vec<String> {
    log.lock()
        .iter()
        .filter(|record| record.level == level)
        .map(|record| record.message.clone())
        .collect()
}

/// A USB-style descriptor as the system transport would report it.
pub fn usb_port(name: &str, product: &str, vid: u16, pid: u16) -> PortDescriptor {
    PortDescriptor::new(name, product, format!("USB VID:PID={vid:04X}:{pid:04X}"))
}
