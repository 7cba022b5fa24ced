//! Data structures for sensor data.
//!
//! This module contains the core data types representing live snapshots,
//! device identity, and the reconstructed history series.

pub mod history;
pub mod snapshot;

pub use history::{DownloadOutcome, HistoryRecord, HistorySeries, RawHistory};
pub use snapshot::{DeviceInfo, SensorSnapshot};
