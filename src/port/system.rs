//! Production transport backed by the `serialport` crate.
//!
//! `serialport` exposes a single per-call timeout, so the five-field
//! [`Timeouts`] model is emulated here: each read or write computes its total
//! budget up front and re-arms the OS timeout with whatever is left before
//! every blocking call.

use super::error::PortError;
use super::traits::{ConnectionConfig, PortDescriptor, SerialHandle, Timeouts, Transport};
use serialport::{SerialPortInfo, SerialPortType};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

/// Upper bound for a single blocking wait, used when a budget is too large
/// to express as a deadline.
const MAX_WAIT_SLICE: Duration = Duration::from_secs(3600);

/// Scratch buffer size for a single OS read.
const READ_CHUNK: usize = 4096;

const NOT_AVAILABLE: &str = "n/a";

/// Transport talking to the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTransport;

impl SystemTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for SystemTransport {
    fn list_ports(&self) -> Result<Vec<PortDescriptor>, PortError> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(describe).collect())
    }

    fn open_handle(&self, config: &ConnectionConfig) -> Result<Box<dyn SerialHandle>, PortError> {
        let handle = SystemHandle::open(config)?;
        Ok(Box::new(handle))
    }
}

fn describe(info: SerialPortInfo) -> PortDescriptor {
    let (description, hardware_id) = match info.port_type {
        SerialPortType::UsbPort(usb) => {
            let description = usb
                .product
                .or(usb.manufacturer)
                .unwrap_or_else(|| "USB serial device".to_string());
            let mut hardware_id = format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid);
            if let Some(serial) = usb.serial_number {
                hardware_id.push_str(" SER=");
                hardware_id.push_str(&serial);
            }
            (description, hardware_id)
        }
        SerialPortType::BluetoothPort => ("Bluetooth".to_string(), NOT_AVAILABLE.to_string()),
        SerialPortType::PciPort => ("PCI".to_string(), NOT_AVAILABLE.to_string()),
        SerialPortType::Unknown => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };

    PortDescriptor {
        port: info.port_name,
        description,
        hardware_id,
    }
}

/// An open port on the host system.
pub struct SystemHandle {
    /// `None` once the handle has been closed.
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
    timeouts: Timeouts,
}

impl SystemHandle {
    /// Open a serial port with the given configuration.
    ///
    /// # Example
    /// ```no_run
    /// use serial_conn::port::{ConnectionConfig, SystemHandle};
    ///
    /// let config = ConnectionConfig::for_port("/dev/ttyUSB0");
    /// let handle = SystemHandle::open(&config)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &ConnectionConfig) -> Result<Self, PortError> {
        let stop_bits = serialport::StopBits::try_from(config.stop_bits)?;

        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .data_bits(config.data_bits.into())
            .flow_control(config.flow_control.into())
            .parity(config.parity.into())
            .stop_bits(stop_bits)
            .timeout(Duration::ZERO)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(config.port.as_str()),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        Ok(Self {
            port: Some(port),
            name: config.port.clone(),
            timeouts: config.timeouts,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, PortError> {
        self.port.as_mut().ok_or(PortError::Closed)
    }
}

impl SerialHandle for SystemHandle {
    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) -> Result<(), PortError> {
        // Dropping the boxed port releases the OS handle.
        match self.port.take() {
            Some(port) => {
                drop(port);
                Ok(())
            }
            None => Err(PortError::Closed),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let budget = Duration::from_millis(self.timeouts.write_budget_ms(data.len()));
        let port = self.port_mut()?;
        if data.is_empty() {
            return Ok(0);
        }

        let deadline = Instant::now().checked_add(budget);
        let mut written = 0;
        let mut first_attempt = true;

        while written < data.len() {
            let remaining = remaining_until(deadline);
            // At least one attempt is always made, even with a zero budget.
            if remaining.is_zero() && !first_attempt {
                break;
            }
            first_attempt = false;

            port.set_timeout(remaining)?;
            match port.write(&data[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    if deadline.is_some() {
                        break;
                    }
                }
                Err(e) => return Err(PortError::Io(e)),
            }
        }

        Ok(written)
    }

    fn read(&mut self, max: usize) -> Result<Vec<u8>, PortError> {
        let budget = Duration::from_millis(self.timeouts.read_budget_ms(max));
        let inter_byte = self
            .timeouts
            .has_inter_byte_limit()
            .then(|| Duration::from_millis(u64::from(self.timeouts.inter_byte_ms)));
        let port = self.port_mut()?;

        // `max` is only an upper bound; storage grows with what arrives.
        let mut received = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        if max == 0 {
            return Ok(received);
        }

        // Zero budget: hand back whatever is already buffered, never block.
        if budget.is_zero() {
            let available = usize::try_from(port.bytes_to_read()?).unwrap_or(usize::MAX);
            let wanted = available.min(max);
            if wanted > 0 {
                port.set_timeout(Duration::ZERO)?;
            }
            while received.len() < wanted {
                let want = (wanted - received.len()).min(READ_CHUNK);
                let n = read_available(&mut **port, &mut chunk[..want])?;
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&chunk[..n]);
            }
            return Ok(received);
        }

        let deadline = Instant::now().checked_add(budget);

        while received.len() < max {
            let remaining = remaining_until(deadline);
            if remaining.is_zero() {
                break;
            }

            let limited_by_gap =
                !received.is_empty() && inter_byte.is_some_and(|gap| gap < remaining);
            let wait = match inter_byte {
                Some(gap) if limited_by_gap => gap,
                _ => remaining,
            };

            let want = (max - received.len()).min(READ_CHUNK);
            port.set_timeout(wait)?;
            match port.read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    if limited_by_gap || deadline.is_some() {
                        break;
                    }
                }
                Err(e) => return Err(PortError::Io(e)),
            }
        }

        Ok(received)
    }
}

fn remaining_until(deadline: Option<Instant>) -> Duration {
    match deadline {
        Some(deadline) => deadline
            .saturating_duration_since(Instant::now())
            .min(MAX_WAIT_SLICE),
        None => MAX_WAIT_SLICE,
    }
}

fn read_available(port: &mut dyn serialport::SerialPort, buffer: &mut [u8]) -> Result<usize, PortError> {
    match port.read(buffer) {
        Ok(n) => Ok(n),
        Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
        Err(e) => Err(PortError::Io(e)),
    }
}

impl std::fmt::Debug for SystemHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemHandle")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .field("timeouts", &self.timeouts)
            .finish()
    }
}
