//! BLE communication module.
//!
//! This module provides the transport seam, connection lifecycle
//! management, and batched characteristic reads for talking to the sensor.

pub mod connection;
pub mod resolver;
pub mod transport;
pub mod uuids;

pub use connection::ConnectionManager;
pub use resolver::CharacteristicResolver;
pub use transport::{BleTransport, DeviceFilter, GattSession, GattTransport};
pub use uuids::*;
