//! Core traits and types for the transport abstraction.
//!
//! Defines the [`Transport`] capability that a
//! [`SerialConnection`](crate::SerialConnection) depends on, the
//! [`SerialHandle`] it owns while open, and the canonical
//! [`ConnectionConfig`] handed across that boundary.

use super::error::PortError;
use serde::{Deserialize, Serialize};

/// One entry of a port enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortDescriptor {
    /// System identifier, e.g. `COM3` or `/dev/ttyACM0`.
    pub port: String,
    /// Human readable label.
    pub description: String,
    /// Vendor/product identifying string.
    pub hardware_id: String,
}

impl PortDescriptor {
    pub fn new(
        port: impl Into<String>,
        description: impl Into<String>,
        hardware_id: impl Into<String>,
    ) -> Self {
        Self {
            port: port.into(),
            description: description.into(),
            hardware_id: hardware_id.into(),
        }
    }
}

/// Read/write timeout settings, all in milliseconds.
///
/// A read of `n` bytes may take at most
/// `read_constant_ms + read_multiplier_ms * n`; writes are bounded the same
/// way. `inter_byte_ms` caps the gap between two received bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub inter_byte_ms: u32,
    pub read_constant_ms: u32,
    pub read_multiplier_ms: u32,
    pub write_constant_ms: u32,
    pub write_multiplier_ms: u32,
}

impl Timeouts {
    /// Sentinel for `inter_byte_ms` disabling the inter-byte timeout.
    pub const NO_INTER_BYTE: u32 = u32::MAX;

    /// The same timeout for reads and writes, no inter-byte limit.
    pub const fn simple(timeout_ms: u32) -> Self {
        Self {
            inter_byte_ms: Self::NO_INTER_BYTE,
            read_constant_ms: timeout_ms,
            read_multiplier_ms: 0,
            write_constant_ms: timeout_ms,
            write_multiplier_ms: 0,
        }
    }

    pub fn has_inter_byte_limit(&self) -> bool {
        self.inter_byte_ms != Self::NO_INTER_BYTE
    }

    /// Total read budget in milliseconds for a request of `size` bytes.
    pub fn read_budget_ms(&self, size: usize) -> u64 {
        budget(self.read_constant_ms, self.read_multiplier_ms, size)
    }

    /// Total write budget in milliseconds for a buffer of `size` bytes.
    pub fn write_budget_ms(&self, size: usize) -> u64 {
        budget(self.write_constant_ms, self.write_multiplier_ms, size)
    }
}

fn budget(constant: u32, multiplier: u32, size: usize) -> u64 {
    let size = u64::try_from(size).unwrap_or(u64::MAX);
    u64::from(constant).saturating_add(u64::from(multiplier).saturating_mul(size))
}

/// Canonical, fully typed parameter set for opening a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Port identifier, e.g. `COM1` on Windows or `/dev/ttyS0` on Linux.
    pub port: String,

    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Read/write timeouts.
    pub timeouts: Timeouts,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Flow control mode.
    pub flow_control: FlowControl,
}

impl ConnectionConfig {
    /// Default baud rate when none is given.
    pub const DEFAULT_BAUD_RATE: u32 = 9600;
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

impl TryFrom<StopBits> for serialport::StopBits {
    type Error = PortError;

    fn try_from(bits: StopBits) -> Result<Self, Self::Error> {
        match bits {
            StopBits::One => Ok(serialport::StopBits::One),
            StopBits::Two => Ok(serialport::StopBits::Two),
            StopBits::OnePointFive => Err(PortError::config(
                "1.5 stop bits are not supported by the system backend",
            )),
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    #[default]
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Platform capability: enumerate ports and acquire handles.
///
/// A [`SerialConnection`](crate::SerialConnection) is generic over this trait
/// so the same lifecycle code drives real hardware and test doubles.
pub trait Transport {
    /// List the serial ports currently present on the system.
    fn list_ports(&self) -> Result<Vec<PortDescriptor>, PortError>;

    /// Open `config.port` with the given settings.
    fn open_handle(&self, config: &ConnectionConfig) -> Result<Box<dyn SerialHandle>, PortError>;
}

/// An open OS-level port handle.
///
/// Blocking calls honor the [`Timeouts`] the handle was opened with.
pub trait SerialHandle: Send + std::fmt::Debug {
    /// Whether the handle still refers to an open port.
    fn is_open(&self) -> bool;

    /// Release the port. Not required to be idempotent; callers must not
    /// close the same handle twice.
    fn close(&mut self) -> Result<(), PortError>;

    /// Write bytes, returning the number actually accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read up to `max` bytes. An empty result means the timeout elapsed
    /// with no data.
    fn read(&mut self, max: usize) -> Result<Vec<u8>, PortError>;
}
