//! History series data structures and assembly.
//!
//! Per-parameter download streams are paged independently, so they can end
//! up with different lengths (a deadline or transport rejection truncates
//! whatever was still downloading). Assembly reconciles them into one
//! chronological sequence of records aligned on the shared sampling grid.

use chrono::{DateTime, Duration, Utc};

use crate::protocol::HistoryParam;

/// One slot of the reconstructed time series.
///
/// A field is `None` when that parameter's stream was shorter than the
/// longest stream; missing data is never back-filled or interpolated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryRecord {
    /// Absolute UTC timestamp of this measurement slot.
    pub timestamp: DateTime<Utc>,
    /// CO2 concentration in ppm.
    pub co2: Option<u16>,
    /// Temperature in degrees Celsius.
    pub temperature: Option<f32>,
    /// Atmospheric pressure in hPa.
    pub pressure: Option<f32>,
    /// Relative humidity in percent.
    pub humidity: Option<u8>,
}

/// How a history download ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DownloadOutcome {
    /// Every parameter stream was drained.
    Complete,
    /// The wall-clock deadline elapsed; remaining rounds were skipped.
    DeadlineExpired,
    /// A write or read was rejected mid-transfer; remaining rounds were
    /// skipped. Distinct from a deadline expiry so callers can render
    /// "partial data" versus "operation failed" differently.
    TransportFailed {
        /// Description of the rejected operation.
        reason: String,
    },
}

/// The assembled history series together with its download outcome.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistorySeries {
    /// Records ordered oldest to newest.
    pub records: Vec<HistoryRecord>,
    /// How the download ended.
    pub outcome: DownloadOutcome,
}

impl HistorySeries {
    /// Whether the download was cut short by the deadline.
    pub fn timed_out(&self) -> bool {
        self.outcome == DownloadOutcome::DeadlineExpired
    }

    /// Whether every parameter stream was fully drained.
    pub fn is_complete(&self) -> bool {
        self.outcome == DownloadOutcome::Complete
    }

    /// Number of records in the series.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Raw per-parameter sample streams accumulated during a download.
#[derive(Debug, Clone, Default)]
pub struct RawHistory {
    co2: Vec<u16>,
    temperature: Vec<u16>,
    pressure: Vec<u16>,
    humidity: Vec<u16>,
}

impl RawHistory {
    /// Append decoded samples to a parameter's stream, in response order.
    pub fn extend(&mut self, param: HistoryParam, samples: &[u16]) {
        self.stream_mut(param).extend_from_slice(samples);
    }

    /// Number of samples accumulated for a parameter.
    pub fn len(&self, param: HistoryParam) -> usize {
        self.stream(param).len()
    }

    /// Length of the longest accumulated stream.
    pub fn max_len(&self) -> usize {
        HistoryParam::ALL
            .iter()
            .map(|param| self.len(*param))
            .max()
            .unwrap_or(0)
    }

    fn stream(&self, param: HistoryParam) -> &Vec<u16> {
        match param {
            HistoryParam::Co2 => &self.co2,
            HistoryParam::Temperature => &self.temperature,
            HistoryParam::Pressure => &self.pressure,
            HistoryParam::Humidity => &self.humidity,
        }
    }

    fn stream_mut(&mut self, param: HistoryParam) -> &mut Vec<u16> {
        match param {
            HistoryParam::Co2 => &mut self.co2,
            HistoryParam::Temperature => &mut self.temperature,
            HistoryParam::Pressure => &mut self.pressure,
            HistoryParam::Humidity => &mut self.humidity,
        }
    }

    /// Assemble the aligned time series.
    ///
    /// With N the longest stream length, record `i` is stamped
    /// `anchor − (N−1−i) × interval`, so the newest record carries the
    /// anchor instant. A stream of length L < N contributes nothing to the
    /// earliest N − L slots.
    pub fn assemble(&self, anchor: DateTime<Utc>, interval_seconds: u16) -> Vec<HistoryRecord> {
        let total = self.max_len();
        let interval = i64::from(interval_seconds);

        (0..total)
            .map(|i| {
                let age_slots = (total - 1 - i) as i64;
                HistoryRecord {
                    timestamp: anchor - Duration::seconds(age_slots * interval),
                    co2: self.sample_at(HistoryParam::Co2, i, total),
                    temperature: self
                        .sample_at(HistoryParam::Temperature, i, total)
                        .map(|raw| f32::from(raw) / 20.0),
                    pressure: self
                        .sample_at(HistoryParam::Pressure, i, total)
                        .map(|raw| f32::from(raw) / 10.0),
                    humidity: self
                        .sample_at(HistoryParam::Humidity, i, total)
                        .map(|raw| raw as u8),
                }
            })
            .collect()
    }

    /// Raw sample of a parameter for series slot `i`, if recorded.
    ///
    /// Shorter streams are right-aligned: their first sample belongs to
    /// slot N − L, not slot 0.
    fn sample_at(&self, param: HistoryParam, i: usize, total: usize) -> Option<u16> {
        let stream = self.stream(param);
        let skipped = total - stream.len();
        i.checked_sub(skipped).map(|index| stream[index])
    }
}
