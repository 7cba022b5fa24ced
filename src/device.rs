//! The sensor device type.
//!
//! [`Aranet4`] ties the connection manager, the characteristic resolver,
//! and the history transfer state machine together into the crate's main
//! entry point.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::ble::connection::ConnectionManager;
use crate::ble::resolver::CharacteristicResolver;
use crate::ble::transport::{DeviceFilter, GattTransport};
use crate::ble::uuids::{
    DEVICE_INFO_SERVICE_UUID, HISTORY_COMMAND_UUID, HISTORY_DATA_UUID, SENSOR_SERVICE_UUID,
};
use crate::data::{DeviceInfo, DownloadOutcome, HistorySeries, RawHistory, SensorSnapshot};
use crate::error::{Error, Result};
use crate::protocol::{DecodedValue, HistoryParam, SensorCharacteristic, HISTORY_CHUNK_SIZE};

/// An Aranet4-class environmental CO2 sensor.
pub struct Aranet4 {
    connection: Arc<ConnectionManager>,
}

impl Aranet4 {
    /// Wall-clock bound on a whole history download (all parameters, all
    /// rounds combined).
    pub const DEFAULT_HISTORY_DEADLINE: Duration = Duration::from_secs(30);

    /// Create a device over a transport with the default acquisition filter.
    pub fn new(transport: Arc<dyn GattTransport>) -> Self {
        Self {
            connection: Arc::new(ConnectionManager::new(transport)),
        }
    }

    /// Create a device with a specific acquisition filter.
    pub fn with_filter(transport: Arc<dyn GattTransport>, filter: DeviceFilter) -> Self {
        Self {
            connection: Arc::new(ConnectionManager::with_filter(transport, filter)),
        }
    }

    /// Check if a session to the sensor is currently connected.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Establish a session, acquiring a device if necessary.
    pub async fn connect(&self) -> Result<()> {
        self.connection.session().await.map(|_| ())
    }

    /// Tear down the current session.
    pub async fn disconnect(&self) -> Result<()> {
        self.connection.disconnect().await
    }

    /// Read a live snapshot of the sensor's state.
    ///
    /// Issues one batched read over the sensor service for the current
    /// values, the age of the latest measurement, and the configured
    /// measurement interval; the anchor instant is reconstructed from the
    /// age relative to the wall clock.
    pub async fn read_snapshot(&self) -> Result<SensorSnapshot> {
        let resolver = CharacteristicResolver::new(&self.connection);

        let mut values = resolver
            .read_characteristics(
                SENSOR_SERVICE_UUID,
                &[
                    SensorCharacteristic::CurrentReadings,
                    SensorCharacteristic::SecondsSinceUpdate,
                    SensorCharacteristic::UpdateInterval,
                ],
            )
            .await?;

        let readings = take(&mut values, SensorCharacteristic::CurrentReadings)?;
        let readings = match readings {
            DecodedValue::Readings(r) => r,
            other => return Err(unexpected(SensorCharacteristic::CurrentReadings, &other)),
        };
        let seconds_since_update =
            match take(&mut values, SensorCharacteristic::SecondsSinceUpdate)? {
                DecodedValue::SecondsSinceUpdate(s) => s,
                other => {
                    return Err(unexpected(SensorCharacteristic::SecondsSinceUpdate, &other))
                }
            };
        let update_interval = match take(&mut values, SensorCharacteristic::UpdateInterval)? {
            DecodedValue::UpdateInterval(s) => s,
            other => return Err(unexpected(SensorCharacteristic::UpdateInterval, &other)),
        };

        Ok(SensorSnapshot {
            values: readings,
            seconds_since_update,
            update_interval,
            last_updated: Utc::now() - chrono::Duration::seconds(i64::from(seconds_since_update)),
        })
    }

    /// Read the device-information service identity strings.
    pub async fn read_device_info(&self) -> Result<DeviceInfo> {
        let resolver = CharacteristicResolver::new(&self.connection);

        let mut values = resolver
            .read_characteristics(
                DEVICE_INFO_SERVICE_UUID,
                &[
                    SensorCharacteristic::ManufacturerName,
                    SensorCharacteristic::ModelNumber,
                    SensorCharacteristic::SerialNumber,
                    SensorCharacteristic::HardwareRevision,
                    SensorCharacteristic::SoftwareRevision,
                ],
            )
            .await?;

        Ok(DeviceInfo {
            manufacturer: take_text(&mut values, SensorCharacteristic::ManufacturerName)?,
            model: take_text(&mut values, SensorCharacteristic::ModelNumber)?,
            serial: take_text(&mut values, SensorCharacteristic::SerialNumber)?,
            hardware_revision: take_text(&mut values, SensorCharacteristic::HardwareRevision)?,
            software_revision: take_text(&mut values, SensorCharacteristic::SoftwareRevision)?,
        })
    }

    /// Download the on-device history log with the default deadline.
    pub async fn download_history(&self) -> Result<HistorySeries> {
        self.download_history_with_deadline(Self::DEFAULT_HISTORY_DEADLINE)
            .await
    }

    /// Download the on-device history log, bounded by a wall-clock deadline.
    ///
    /// Each tracked parameter is paged independently through the history
    /// command/data characteristic pair; an empty data response ends that
    /// parameter's stream. Once the deadline elapses no further commands
    /// are issued for the current or remaining parameters, and whatever
    /// was accumulated is assembled into a partial series; a deadline
    /// expiry is an outcome, not an error. A rejected write or read
    /// likewise stops the transfer, with the rejection carried in the
    /// outcome so it stays distinguishable from a timeout.
    pub async fn download_history_with_deadline(
        &self,
        deadline: Duration,
    ) -> Result<HistorySeries> {
        let session = self.connection.session().await?;
        let started = Instant::now();

        let mut raw = RawHistory::default();
        let mut outcome = DownloadOutcome::Complete;

        'params: for param in HistoryParam::ALL {
            debug!("Downloading history for {:?}", param);
            // Record offsets are 1-based on the wire.
            let mut offset: u16 = 1;

            loop {
                if started.elapsed() >= deadline {
                    info!(
                        "History deadline of {:?} elapsed at {:?}, stopping after {} samples",
                        deadline,
                        param,
                        raw.len(param)
                    );
                    outcome = DownloadOutcome::DeadlineExpired;
                    break 'params;
                }

                let command = param.encode_command(offset);
                if let Err(e) = session
                    .write_value(SENSOR_SERVICE_UUID, HISTORY_COMMAND_UUID, &command)
                    .await
                {
                    warn!("History command rejected at {:?}: {}", param, e);
                    outcome = DownloadOutcome::TransportFailed {
                        reason: e.to_string(),
                    };
                    break 'params;
                }

                let chunk = match session
                    .read_value(SENSOR_SERVICE_UUID, HISTORY_DATA_UUID)
                    .await
                {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("History data read rejected at {:?}: {}", param, e);
                        outcome = DownloadOutcome::TransportFailed {
                            reason: e.to_string(),
                        };
                        break 'params;
                    }
                };

                if chunk.is_empty() {
                    debug!("{:?} stream exhausted after {} samples", param, raw.len(param));
                    break;
                }

                let samples = param.decode_chunk(&chunk)?;
                raw.extend(param, &samples);
                offset = match offset.checked_add(HISTORY_CHUNK_SIZE) {
                    Some(next) => next,
                    // The wire offset is a u16; records beyond it cannot
                    // be addressed, so the stream ends here.
                    None => break,
                };
            }
        }

        // Timestamps hang off the device's own notion of "now": the anchor
        // is the latest measurement instant, fetched fresh after paging.
        let resolver = CharacteristicResolver::new(&self.connection);
        let mut values = resolver
            .read_characteristics(
                SENSOR_SERVICE_UUID,
                &[
                    SensorCharacteristic::SecondsSinceUpdate,
                    SensorCharacteristic::UpdateInterval,
                ],
            )
            .await?;

        let seconds_since_update =
            match take(&mut values, SensorCharacteristic::SecondsSinceUpdate)? {
                DecodedValue::SecondsSinceUpdate(s) => s,
                other => {
                    return Err(unexpected(SensorCharacteristic::SecondsSinceUpdate, &other))
                }
            };
        let update_interval = match take(&mut values, SensorCharacteristic::UpdateInterval)? {
            DecodedValue::UpdateInterval(s) => s,
            other => return Err(unexpected(SensorCharacteristic::UpdateInterval, &other)),
        };

        let anchor = Utc::now() - chrono::Duration::seconds(i64::from(seconds_since_update));
        let records = raw.assemble(anchor, update_interval);

        info!(
            "Assembled {} history records ({:?})",
            records.len(),
            outcome
        );

        Ok(HistorySeries { records, outcome })
    }
}

impl std::fmt::Debug for Aranet4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aranet4").finish_non_exhaustive()
    }
}

fn take(
    values: &mut HashMap<SensorCharacteristic, DecodedValue>,
    kind: SensorCharacteristic,
) -> Result<DecodedValue> {
    values.remove(&kind).ok_or(Error::CharacteristicNotFound {
        uuid: kind.uuid(),
    })
}

fn take_text(
    values: &mut HashMap<SensorCharacteristic, DecodedValue>,
    kind: SensorCharacteristic,
) -> Result<String> {
    match take(values, kind)? {
        DecodedValue::Text(text) => Ok(text),
        other => Err(unexpected(kind, &other)),
    }
}

fn unexpected(kind: SensorCharacteristic, value: &DecodedValue) -> Error {
    Error::DecodeFailed {
        characteristic: kind.uuid(),
        context: format!("unexpected decoded value {:?}", value),
    }
}
