//! Transport abstraction layer for serial communication.
//!
//! Provides the [`Transport`] capability the connection layer depends on, a
//! production implementation over the host's serial ports, and an in-memory
//! implementation for tests.

pub mod error;
pub mod mock;
pub mod system;
pub mod traits;

pub use error::PortError;
pub use mock::{MockHandle, MockTransport};
pub use system::{SystemHandle, SystemTransport};
pub use traits::*;
