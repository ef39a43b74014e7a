//! Hardware-specific tests requiring real serial devices.
//!
//! These tests are ignored by default and require actual hardware to run.
//! They should be run manually with the `--ignored` flag and the `TEST_PORT`
//! environment variable pointing at a device.

pub mod port_discovery_tests;
pub mod real_port_tests;
pub mod utils;
