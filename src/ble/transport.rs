//! GATT transport abstraction and the btleplug-backed implementation.
//!
//! The traits here form the seam between the protocol client and the
//! physical radio. Everything above this module talks in terms of
//! service/characteristic UUIDs and raw byte payloads, so the whole
//! client can be driven by a scripted transport in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use parking_lot::RwLock;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::uuids::{BATTERY_SERVICE_UUID, DEVICE_INFO_SERVICE_UUID, SENSOR_SERVICE_UUID};
use crate::error::{Error, Result};

/// Device acquisition filter.
///
/// Mirrors the Web Bluetooth style request options: a required service the
/// device must advertise, plus optional services the session intends to use.
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    /// Services the device must advertise to be acquired.
    pub services: Vec<Uuid>,
    /// Additional services the session may access once connected.
    pub optional_services: Vec<Uuid>,
    /// How long to scan before giving up on acquisition.
    pub scan_timeout: Duration,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            services: vec![SENSOR_SERVICE_UUID],
            optional_services: vec![
                SENSOR_SERVICE_UUID,
                DEVICE_INFO_SERVICE_UUID,
                BATTERY_SERVICE_UUID,
            ],
            scan_timeout: Duration::from_secs(15),
        }
    }
}

/// An open session to a connected device.
///
/// Owned exclusively by the connection manager; other components borrow it
/// for the duration of one call.
#[async_trait]
pub trait GattSession: Send + Sync {
    /// Check whether the link is still up.
    async fn is_connected(&self) -> bool;

    /// Read the value of a characteristic within a service.
    async fn read_value(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>>;

    /// Write a value to a characteristic within a service.
    async fn write_value(&self, service: Uuid, characteristic: Uuid, data: &[u8]) -> Result<()>;

    /// Tear down the link.
    async fn disconnect(&self) -> Result<()>;
}

/// Acquires devices and establishes sessions.
#[async_trait]
pub trait GattTransport: Send + Sync {
    /// Acquire a matching device, establish the link, and discover services.
    async fn acquire_device(&self, filter: &DeviceFilter) -> Result<Arc<dyn GattSession>>;
}

/// btleplug-backed transport over the first available adapter.
pub struct BleTransport {
    adapter: Adapter,
}

impl BleTransport {
    /// Create a transport on the system's first Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self { adapter })
    }

    /// Create a transport on a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Scan until a peripheral advertising one of the filter services shows up.
    async fn scan_for_device(&self, filter: &DeviceFilter) -> Result<Peripheral> {
        self.adapter
            .start_scan(ScanFilter {
                services: filter.services.clone(),
            })
            .await
            .map_err(Error::Bluetooth)?;

        let found = tokio::time::timeout(filter.scan_timeout, self.wait_for_match(filter)).await;

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        match found {
            Ok(result) => result,
            Err(_elapsed) => Err(Error::ConnectionFailed {
                reason: format!(
                    "No matching device found within {:?}",
                    filter.scan_timeout
                ),
            }),
        }
    }

    async fn wait_for_match(&self, filter: &DeviceFilter) -> Result<Peripheral> {
        // A matching peripheral may already be cached from a previous scan.
        for peripheral in self.adapter.peripherals().await.map_err(Error::Bluetooth)? {
            if Self::matches(&peripheral, filter).await {
                return Ok(peripheral);
            }
        }

        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        while let Some(event) = events.next().await {
            use btleplug::api::CentralEvent;

            let id = match event {
                CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                _ => continue,
            };

            let peripheral = match self.adapter.peripheral(&id).await {
                Ok(p) => p,
                Err(e) => {
                    trace!("Failed to get peripheral: {}", e);
                    continue;
                }
            };

            if Self::matches(&peripheral, filter).await {
                return Ok(peripheral);
            }
        }

        Err(Error::ConnectionFailed {
            reason: "Adapter event stream ended during scan".to_string(),
        })
    }

    async fn matches(peripheral: &Peripheral, filter: &DeviceFilter) -> bool {
        let properties = match peripheral.properties().await {
            Ok(Some(p)) => p,
            _ => return false,
        };

        filter
            .services
            .iter()
            .any(|service| properties.services.contains(service))
    }
}

#[async_trait]
impl GattTransport for BleTransport {
    async fn acquire_device(&self, filter: &DeviceFilter) -> Result<Arc<dyn GattSession>> {
        let peripheral = self.scan_for_device(filter).await?;

        debug!("Connecting to peripheral {:?}", peripheral.id());
        peripheral.connect().await.map_err(Error::Bluetooth)?;
        peripheral
            .discover_services()
            .await
            .map_err(Error::Bluetooth)?;

        let session = BleSession::new(peripheral);
        info!("Session established");

        Ok(Arc::new(session))
    }
}

/// A live btleplug session with a resolved characteristic cache.
pub struct BleSession {
    peripheral: Peripheral,
    /// Characteristics keyed by (service, characteristic) UUID pair.
    ///
    /// Populated once at session establishment; a characteristic handle is
    /// never reused across sessions.
    characteristics: RwLock<HashMap<(Uuid, Uuid), Characteristic>>,
}

impl BleSession {
    fn new(peripheral: Peripheral) -> Self {
        let mut cache = HashMap::new();

        for service in peripheral.services() {
            for characteristic in service.characteristics {
                trace!(
                    "Found characteristic {} in service {}",
                    characteristic.uuid,
                    service.uuid
                );
                cache.insert((service.uuid, characteristic.uuid), characteristic);
            }
        }

        debug!("Cached {} characteristics", cache.len());

        Self {
            peripheral,
            characteristics: RwLock::new(cache),
        }
    }

    fn lookup(&self, service: Uuid, characteristic: Uuid) -> Result<Characteristic> {
        let cache = self.characteristics.read();

        if let Some(c) = cache.get(&(service, characteristic)) {
            return Ok(c.clone());
        }

        // Distinguish an unknown service from an unknown characteristic.
        if cache.keys().any(|(s, _)| *s == service) {
            Err(Error::CharacteristicNotFound {
                uuid: characteristic,
            })
        } else {
            Err(Error::ServiceNotFound { uuid: service })
        }
    }
}

#[async_trait]
impl GattSession for BleSession {
    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn read_value(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>> {
        let c = self.lookup(service, characteristic)?;

        let data = self
            .peripheral
            .read(&c)
            .await
            .map_err(Error::Bluetooth)?;

        trace!("Read {} bytes from characteristic {}", data.len(), characteristic);

        Ok(data)
    }

    async fn write_value(&self, service: Uuid, characteristic: Uuid, data: &[u8]) -> Result<()> {
        let c = self.lookup(service, characteristic)?;

        self.peripheral
            .write(&c, data, WriteType::WithResponse)
            .await
            .map_err(Error::Bluetooth)?;

        trace!("Wrote {} bytes to characteristic {}", data.len(), characteristic);

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await.map_err(Error::Bluetooth)
    }
}
