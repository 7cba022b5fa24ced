//! Current sensor value decoding.
//!
//! The sensor exposes its live measurements as a single fixed-layout
//! 8-byte little-endian record:
//!
//! | Offset | Field | Encoding |
//! |-------:|-------------|---------------------------|
//! | 0      | CO2         | u16, ppm |
//! | 2      | Temperature | u16, twentieths of a °C |
//! | 4      | Pressure    | u16, tenths of an hPa |
//! | 6      | Humidity    | u8, percent |
//! | 7      | Battery     | u8, percent |

use bytes::Buf;

use crate::ble::uuids::CURRENT_READINGS_UUID;
use crate::error::{Error, Result};

/// Live measurements decoded from the current-values characteristic.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurrentReadings {
    /// CO2 concentration in ppm.
    pub co2: u16,
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Atmospheric pressure in hPa.
    pub pressure: f32,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Battery level in percent.
    pub battery: u8,
}

impl CurrentReadings {
    /// Encoded size of the current-values record.
    pub const ENCODED_LEN: usize = 8;

    /// Decode a current-values payload.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::ENCODED_LEN {
            return Err(Error::DecodeFailed {
                characteristic: CURRENT_READINGS_UUID,
                context: format!(
                    "payload too short: {} bytes, need {}",
                    data.len(),
                    Self::ENCODED_LEN
                ),
            });
        }

        let mut buf = data;

        Ok(Self {
            co2: buf.get_u16_le(),
            temperature: f32::from(buf.get_u16_le()) / 20.0,
            pressure: f32::from(buf.get_u16_le()) / 10.0,
            humidity: buf.get_u8(),
            battery: buf.get_u8(),
        })
    }
}

/// Decode a u16 little-endian value at offset 0 of a payload.
///
/// Shared by the seconds-since-update and update-interval characteristics.
pub fn parse_u16_le(data: &[u8], characteristic: uuid::Uuid) -> Result<u16> {
    if data.len() < 2 {
        return Err(Error::DecodeFailed {
            characteristic,
            context: format!("payload too short: {} bytes, need 2", data.len()),
        });
    }

    let mut buf = data;
    Ok(buf.get_u16_le())
}
