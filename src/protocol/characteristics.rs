//! Characteristic kinds and their decode rules.
//!
//! Every characteristic this client reads is enumerated here as a closed
//! set of kinds, each carrying its UUID and decode rule. The resolver
//! dispatches on the kind, so an unknown characteristic cannot appear and
//! the decode dispatch is checked exhaustively at compile time.

use uuid::Uuid;

use crate::ble::uuids::{
    CURRENT_READINGS_UUID, HARDWARE_REVISION_UUID, MANUFACTURER_NAME_UUID, MODEL_NUMBER_UUID,
    SECONDS_SINCE_UPDATE_UUID, SERIAL_NUMBER_UUID, SOFTWARE_REVISION_UUID, UPDATE_INTERVAL_UUID,
};
use crate::error::{Error, Result};
use crate::protocol::readings::{parse_u16_le, CurrentReadings};

/// A readable characteristic known to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorCharacteristic {
    /// Live sensor measurements (sensor service).
    CurrentReadings,
    /// Seconds elapsed since the last measurement (sensor service).
    SecondsSinceUpdate,
    /// Configured measurement interval in seconds (sensor service).
    UpdateInterval,
    /// Manufacturer name (device-information service).
    ManufacturerName,
    /// Model number (device-information service).
    ModelNumber,
    /// Serial number (device-information service).
    SerialNumber,
    /// Hardware revision (device-information service).
    HardwareRevision,
    /// Software revision (device-information service).
    SoftwareRevision,
}

/// A decoded characteristic payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// Decoded live measurements.
    Readings(CurrentReadings),
    /// Seconds since the last measurement.
    SecondsSinceUpdate(u32),
    /// Measurement interval in seconds.
    UpdateInterval(u16),
    /// UTF-8 text value.
    Text(String),
}

impl SensorCharacteristic {
    /// The characteristic's UUID on the wire.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::CurrentReadings => CURRENT_READINGS_UUID,
            Self::SecondsSinceUpdate => SECONDS_SINCE_UPDATE_UUID,
            Self::UpdateInterval => UPDATE_INTERVAL_UUID,
            Self::ManufacturerName => MANUFACTURER_NAME_UUID,
            Self::ModelNumber => MODEL_NUMBER_UUID,
            Self::SerialNumber => SERIAL_NUMBER_UUID,
            Self::HardwareRevision => HARDWARE_REVISION_UUID,
            Self::SoftwareRevision => SOFTWARE_REVISION_UUID,
        }
    }

    /// Apply this kind's decode rule to a raw payload.
    pub fn decode(&self, raw: &[u8]) -> Result<DecodedValue> {
        match self {
            Self::CurrentReadings => CurrentReadings::parse(raw).map(DecodedValue::Readings),
            Self::SecondsSinceUpdate => parse_u16_le(raw, self.uuid())
                .map(|seconds| DecodedValue::SecondsSinceUpdate(u32::from(seconds))),
            Self::UpdateInterval => {
                parse_u16_le(raw, self.uuid()).map(DecodedValue::UpdateInterval)
            }
            Self::ManufacturerName
            | Self::ModelNumber
            | Self::SerialNumber
            | Self::HardwareRevision
            | Self::SoftwareRevision => String::from_utf8(raw.to_vec())
                .map(DecodedValue::Text)
                .map_err(|_| Error::DecodeFailed {
                    characteristic: self.uuid(),
                    context: "invalid UTF-8".to_string(),
                }),
        }
    }
}

impl DecodedValue {
    /// The decoded readings, if this is a readings value.
    pub fn as_readings(&self) -> Option<&CurrentReadings> {
        match self {
            Self::Readings(readings) => Some(readings),
            _ => None,
        }
    }

    /// The seconds-since-update count, if that is what was decoded.
    pub fn as_seconds_since_update(&self) -> Option<u32> {
        match self {
            Self::SecondsSinceUpdate(seconds) => Some(*seconds),
            _ => None,
        }
    }

    /// The update interval in seconds, if that is what was decoded.
    pub fn as_update_interval(&self) -> Option<u16> {
        match self {
            Self::UpdateInterval(seconds) => Some(*seconds),
            _ => None,
        }
    }

    /// The text value, if this is a text characteristic.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_seconds_since_update() {
        let value = SensorCharacteristic::SecondsSinceUpdate
            .decode(&[0x3c, 0x00])
            .unwrap();
        assert_eq!(value.as_seconds_since_update(), Some(60));
    }

    #[test]
    fn decodes_update_interval() {
        let value = SensorCharacteristic::UpdateInterval
            .decode(&[0x2c, 0x01])
            .unwrap();
        assert_eq!(value.as_update_interval(), Some(300));
    }

    #[test]
    fn decodes_device_info_text() {
        let value = SensorCharacteristic::ManufacturerName
            .decode(b"SAF Tehnika")
            .unwrap();
        assert_eq!(value.as_text(), Some("SAF Tehnika"));
    }

    #[test]
    fn invalid_utf8_is_decode_failure() {
        let err = SensorCharacteristic::ModelNumber
            .decode(&[0xff, 0xfe])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DecodeFailed { characteristic, .. }
                if characteristic == SensorCharacteristic::ModelNumber.uuid()
        ));
    }

    #[test]
    fn accessor_mismatch_returns_none() {
        let value = SensorCharacteristic::UpdateInterval
            .decode(&[0x2c, 0x01])
            .unwrap();
        assert!(value.as_readings().is_none());
        assert!(value.as_text().is_none());
    }
}
