//! Live snapshot and device identity data.

use chrono::{DateTime, Utc};

use crate::protocol::CurrentReadings;

/// A point-in-time snapshot of the sensor's live state.
///
/// Immutable once constructed; one is produced per refresh.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorSnapshot {
    /// Decoded live measurements.
    pub values: CurrentReadings,
    /// How old the measurements were at snapshot time, in seconds.
    pub seconds_since_update: u32,
    /// Configured measurement interval in seconds.
    pub update_interval: u16,
    /// Absolute instant of the most recent measurement (the anchor).
    pub last_updated: DateTime<Utc>,
}

/// Identity strings from the standard device-information service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model number.
    pub model: String,
    /// Serial number.
    pub serial: String,
    /// Hardware revision.
    pub hardware_revision: String,
    /// Software revision.
    pub software_revision: String,
}
