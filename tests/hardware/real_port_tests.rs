//! Open/write/read/close against a real device.
//!
//! ```bash
//! TEST_PORT=/dev/ttyACM0 cargo test --test integration_hardware -- --ignored
//! ```
//!
//! The exchange test expects firmware that answers every write with the
//! upper-cased payload; set `TEST_UPPER_ECHO=0` for a plain loopback.

use parking_lot::Mutex;
use serial_conn::{LogLevel, SerialConnection};
use std::sync::Arc;
use std::time::Duration;

use crate::hardware::utils::{print_available_ports, TestPortConfig, TimingHelper};

#[test]
#[ignore] // Requires hardware
fn test_real_hello_exchange() {
    let Some(config) = TestPortConfig::from_env() else {
        println!("⏭️  Skipping: TEST_PORT not set");
        print_available_ports();
        return;
    };

    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);

    let mut serial = SerialConnection::system();
    serial.set_log_function(move |record| {
        sink.lock().push(format!("{} {}: {}", record.level, record.function, record.message));
    });

    let timer = TimingHelper::new(&format!("hello exchange on {}", config.port_name));
    serial
        .open_with_timeout(&config.port_name, config.timeout_ms)
        .unwrap();
    assert!(serial.is_open());
    timer.checkpoint("opened");

    // Nothing has been sent yet, so the read times out empty.
    let stale = serial.read_bytes(5).unwrap();
    assert!(stale.is_empty(), "unexpected pending bytes: {stale:?}");
    timer.checkpoint("empty read timed out");

    assert_eq!(serial.write_bytes(b"hello").unwrap(), 5);
    let reply = serial.read_bytes(5).unwrap();
    timer.checkpoint("reply read");

    let expected: &[u8] = if config.upper_echo { b"HELLO" } else { b"hello" };
    assert_eq!(reply, expected);

    serial.close().unwrap();
    assert!(!serial.is_open());
    let elapsed = timer.finish();
    assert!(elapsed < Duration::from_millis(u64::from(config.timeout_ms) * 4 + 1000));

    let records = records.lock();
    assert!(records.iter().any(|r| r.starts_with(&LogLevel::Info.to_string())));
}

#[test]
#[ignore] // Requires hardware
fn test_real_bare_open_reads_immediately() {
    let Some(config) = TestPortConfig::from_env() else {
        println!("⏭️  Skipping: TEST_PORT not set");
        return;
    };

    let mut serial = SerialConnection::system();
    serial.open(&config.port_name).unwrap();

    let timer = TimingHelper::new("zero-timeout read");
    let _ = serial.read_bytes(64).unwrap();
    assert!(timer.finish() < Duration::from_millis(200));
}

#[test]
#[ignore] // Requires hardware
fn test_real_missing_port_is_io_failure() {
    let mut serial = SerialConnection::system();
    let err = serial
        .open_with_timeout("/dev/serial-conn-does-not-exist", 100)
        .unwrap_err();
    assert!(err.is_io_failure());
    assert!(!serial.is_open());
}
