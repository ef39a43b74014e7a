//! Normalization of the open call shapes into a [`ConnectionConfig`].
//!
//! Line settings arrive either as typed enums or as small integer codes:
//!
//! | Field         | Codes                                     |
//! |---------------|-------------------------------------------|
//! | `data_bits`   | 5, 6, 7, 8                                |
//! | `parity`      | 0 none, 1 odd, 2 even                     |
//! | `stop_bits`   | 0 one, 1 one-point-five, 2 two            |
//! | `flow_control`| 0 none, 1 software, 2 hardware            |
//!
//! Any other code is rejected with `InvalidArgument(<field>)`. Baud rate and
//! timeouts are passed through untouched.

use crate::error::SerialError;
use crate::port::{ConnectionConfig, DataBits, FlowControl, Parity, StopBits, Timeouts};
use serde::{Deserialize, Serialize};

/// The full open form: every parameter as a primitive value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOpenParams {
    pub port: String,
    pub baud_rate: u32,
    pub inter_byte_ms: u32,
    pub read_constant_ms: u32,
    pub read_multiplier_ms: u32,
    pub write_constant_ms: u32,
    pub write_multiplier_ms: u32,
    pub data_bits: u32,
    pub parity: u32,
    pub stop_bits: u32,
    pub flow_control: u32,
}

impl RawOpenParams {
    /// Raw parameters equivalent to [`ConnectionConfig::for_port`].
    pub fn for_port(port: impl Into<String>) -> Self {
        ConnectionConfig::for_port(port).into()
    }
}

impl From<ConnectionConfig> for RawOpenParams {
    fn from(config: ConnectionConfig) -> Self {
        Self {
            port: config.port,
            baud_rate: config.baud_rate,
            inter_byte_ms: config.timeouts.inter_byte_ms,
            read_constant_ms: config.timeouts.read_constant_ms,
            read_multiplier_ms: config.timeouts.read_multiplier_ms,
            write_constant_ms: config.timeouts.write_constant_ms,
            write_multiplier_ms: config.timeouts.write_multiplier_ms,
            data_bits: config.data_bits.code(),
            parity: config.parity.code(),
            stop_bits: config.stop_bits.code(),
            flow_control: config.flow_control.code(),
        }
    }
}

impl TryFrom<RawOpenParams> for ConnectionConfig {
    type Error = SerialError;

    fn try_from(raw: RawOpenParams) -> Result<Self, Self::Error> {
        ConnectionConfig::from_raw(&raw)
    }
}

impl ConnectionConfig {
    /// Validate and convert the full open form.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming the first offending field, checked in the
    /// order `port`, `dataBits`, `parity`, `stopBits`, `flowControl`.
    pub fn from_raw(raw: &RawOpenParams) -> Result<Self, SerialError> {
        check_port(&raw.port)?;

        Ok(Self {
            port: raw.port.clone(),
            baud_rate: raw.baud_rate,
            timeouts: Timeouts {
                inter_byte_ms: raw.inter_byte_ms,
                read_constant_ms: raw.read_constant_ms,
                read_multiplier_ms: raw.read_multiplier_ms,
                write_constant_ms: raw.write_constant_ms,
                write_multiplier_ms: raw.write_multiplier_ms,
            },
            data_bits: DataBits::try_from(raw.data_bits)?,
            parity: Parity::try_from(raw.parity)?,
            stop_bits: StopBits::try_from(raw.stop_bits)?,
            flow_control: FlowControl::try_from(raw.flow_control)?,
        })
    }

    /// The simple-timeout form: 9600 8N1, no flow control, `timeout_ms` for
    /// both reads and writes and no inter-byte timeout.
    pub fn with_simple_timeout(port: impl Into<String>, timeout_ms: u32) -> Self {
        Self {
            timeouts: Timeouts::simple(timeout_ms),
            ..Self::for_port(port)
        }
    }

    /// The bare-port form: 9600 8N1, no flow control, all timeouts zero.
    ///
    /// Zero timeouts mean reads return immediately with whatever is already
    /// buffered.
    pub fn for_port(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            timeouts: Timeouts::default(),
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            flow_control: FlowControl::default(),
        }
    }

    /// Check the parts of an already-typed config that the type system
    /// cannot guarantee.
    pub fn validate(&self) -> Result<(), SerialError> {
        check_port(&self.port)
    }
}

fn check_port(port: &str) -> Result<(), SerialError> {
    if port.is_empty() {
        return Err(SerialError::invalid_argument("port"));
    }
    Ok(())
}

impl TryFrom<u32> for DataBits {
    type Error = SerialError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            _ => Err(SerialError::invalid_argument("dataBits")),
        }
    }
}

impl DataBits {
    pub fn code(self) -> u32 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl TryFrom<u32> for Parity {
    type Error = SerialError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Odd),
            2 => Ok(Self::Even),
            _ => Err(SerialError::invalid_argument("parity")),
        }
    }
}

impl Parity {
    pub fn code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Odd => 1,
            Self::Even => 2,
        }
    }
}

impl TryFrom<u32> for StopBits {
    type Error = SerialError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::One),
            1 => Ok(Self::OnePointFive),
            2 => Ok(Self::Two),
            _ => Err(SerialError::invalid_argument("stopBits")),
        }
    }
}

impl StopBits {
    pub fn code(self) -> u32 {
        match self {
            Self::One => 0,
            Self::OnePointFive => 1,
            Self::Two => 2,
        }
    }
}

impl TryFrom<u32> for FlowControl {
    type Error = SerialError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Software),
            2 => Ok(Self::Hardware),
            _ => Err(SerialError::invalid_argument("flowControl")),
        }
    }
}

impl FlowControl {
    pub fn code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Software => 1,
            Self::Hardware => 2,
        }
    }
}
