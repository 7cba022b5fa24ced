// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # aranet-rust-ble
//!
//! A cross-platform Rust library for reading Aranet4-class environmental
//! CO2 sensors via Bluetooth Low Energy.
//!
//! ## Features
//!
//! - **Live snapshots**: CO2, temperature, pressure, humidity, and battery
//!   in one batched read
//! - **History download**: paginated retrieval of the on-device log,
//!   reconciled into a single aligned time series
//! - **Partial results**: a download cut short by the 30-second deadline
//!   or a mid-transfer transport rejection still yields the data collected
//!   so far, with the cause carried in the result
//! - **Testable transport seam**: the GATT layer is a trait, with a
//!   scripted mock included for hardware-free testing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aranet_rust_ble::{Aranet4, BleTransport, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let transport = Arc::new(BleTransport::new().await?);
//!     let sensor = Aranet4::new(transport);
//!
//!     let snapshot = sensor.read_snapshot().await?;
//!     println!("CO2: {} ppm", snapshot.values.co2);
//!     println!("Temperature: {:.1}°C", snapshot.values.temperature);
//!
//!     let history = sensor.download_history().await?;
//!     println!(
//!         "{} history records (timed out: {})",
//!         history.len(),
//!         history.timed_out()
//!     );
//!
//!     sensor.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod data;
pub mod device;
pub mod error;
pub mod mock;
pub mod protocol;

// Re-exports for convenience
pub use device::Aranet4;
pub use error::{Error, Result};

// Re-export commonly used types from submodules
pub use ble::connection::ConnectionManager;
pub use ble::resolver::CharacteristicResolver;
pub use ble::transport::{BleTransport, DeviceFilter, GattSession, GattTransport};
pub use data::{DeviceInfo, DownloadOutcome, HistoryRecord, HistorySeries, SensorSnapshot};
pub use protocol::{CurrentReadings, HistoryParam, SensorCharacteristic};
