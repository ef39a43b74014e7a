//! Utility functions for hardware testing.

use serial_conn::{PortDescriptor, SerialConnection};
use std::env;
use std::time::{Duration, Instant};

/// Test port configuration from environment.
pub struct TestPortConfig {
    pub port_name: String,
    pub timeout_ms: u32,
    /// Device echoes writes back upper-cased (the reference firmware does).
    pub upper_echo: bool,
}

impl TestPortConfig {
    /// Read `TEST_PORT`, `TEST_TIMEOUT_MS` and `TEST_UPPER_ECHO`.
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("TEST_PORT").ok()?;
        let timeout_ms = env::var("TEST_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(500);
        let upper_echo = env::var("TEST_UPPER_ECHO").ok().as_deref() != Some("0");

        Some(TestPortConfig {
            port_name,
            timeout_ms,
            upper_echo,
        })
    }
}

/// Enumerate ports through the library, empty on failure.
pub fn discover_available_ports() -> Vec<PortDescriptor> {
    SerialConnection::system().list_ports().unwrap_or_default()
}

/// Print available ports for debugging.
pub fn print_available_ports() {
    let ports = discover_available_ports();

    if ports.is_empty() {
        println!("No serial ports detected on this system");
        return;
    }

    println!("Available serial ports ({}):", ports.len());
    for (idx, port) in ports.iter().enumerate() {
        println!("  {}. {}", idx + 1, port.port);
        println!("     Description: {}", port.description);
        println!("     Hardware ID: {}", port.hardware_id);
    }
}

/// Stopwatch that prints checkpoints.
pub struct TimingHelper {
    label: String,
    start: Instant,
}

impl TimingHelper {
    pub fn new(label: &str) -> Self {
        println!("⏱️  {label}");
        Self {
            label: label.to_string(),
            start: Instant::now(),
        }
    }

    pub fn checkpoint(&self, what: &str) {
        println!("   {:>8.1?}  {what}", self.start.elapsed());
    }

    pub fn finish(&self) -> Duration {
        let elapsed = self.start.elapsed();
        println!("   {} finished in {elapsed:?}", self.label);
        elapsed
    }
}
