//! History download wire protocol.
//!
//! The on-device log is read one parameter at a time through a
//! command/data characteristic pair. Each round writes a 5-byte command
//! selecting the parameter, a 1-based record offset, and a chunk size,
//! then reads back a packed array of fixed-width samples. An empty
//! response means the parameter's stream is exhausted.

use bytes::Buf;

use crate::ble::uuids::HISTORY_DATA_UUID;
use crate::error::{Error, Result};

/// Number of records requested per paging round.
pub const HISTORY_CHUNK_SIZE: u16 = 100;

/// Parameters stored in the on-device history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HistoryParam {
    /// CO2 concentration, 2-byte samples, ppm unscaled.
    Co2 = 1,
    /// Temperature, 2-byte samples in twentieths of a °C.
    Temperature = 2,
    /// Pressure, 2-byte samples in tenths of an hPa.
    Pressure = 3,
    /// Relative humidity, 1-byte samples, percent unscaled.
    Humidity = 4,
}

impl HistoryParam {
    /// Download iteration order.
    pub const ALL: [HistoryParam; 4] = [
        HistoryParam::Temperature,
        HistoryParam::Humidity,
        HistoryParam::Pressure,
        HistoryParam::Co2,
    ];

    /// Width of one packed sample in bytes.
    pub fn sample_width(&self) -> usize {
        match self {
            HistoryParam::Humidity => 1,
            HistoryParam::Co2 | HistoryParam::Temperature | HistoryParam::Pressure => 2,
        }
    }

    /// Encode a paging command for this parameter.
    ///
    /// Layout: parameter id (u8), starting record offset (u16 LE, 1-based),
    /// requested chunk size (u16 LE).
    pub fn encode_command(&self, start_offset: u16) -> [u8; 5] {
        let offset = start_offset.to_le_bytes();
        let chunk = HISTORY_CHUNK_SIZE.to_le_bytes();
        [*self as u8, offset[0], offset[1], chunk[0], chunk[1]]
    }

    /// Decode a data-characteristic response into raw samples.
    ///
    /// Samples stay unscaled here; scaling is applied when records are
    /// assembled. One-byte samples are widened to u16.
    pub fn decode_chunk(&self, data: &[u8]) -> Result<Vec<u16>> {
        let width = self.sample_width();

        if data.len() % width != 0 {
            return Err(Error::DecodeFailed {
                characteristic: HISTORY_DATA_UUID,
                context: format!(
                    "chunk length {} is not a multiple of the {}-byte sample width for {:?}",
                    data.len(),
                    width,
                    self
                ),
            });
        }

        let mut buf = data;
        let mut samples = Vec::with_capacity(data.len() / width);

        while buf.has_remaining() {
            let sample = match width {
                1 => u16::from(buf.get_u8()),
                _ => buf.get_u16_le(),
            };
            samples.push(sample);
        }

        Ok(samples)
    }
}
