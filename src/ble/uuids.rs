//! BLE Service and Characteristic UUIDs.
//!
//! Contains all UUID constants used for Aranet4 sensor communication.

use uuid::Uuid;

/// Base UUID for 16-bit Bluetooth SIG assigned numbers.
const BLUETOOTH_BASE: u128 = 0x0000_0000_0000_1000_8000_00805f9b34fb;

/// Expand a 16-bit assigned number into a full 128-bit Bluetooth UUID.
pub const fn bluetooth_uuid_from_u16(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE | ((short as u128) << 96))
}

// Aranet Sensor Service (Aranet Custom)
/// Aranet sensor service UUID (16-bit assigned number 0xFCE0).
pub const SENSOR_SERVICE_UUID: Uuid = bluetooth_uuid_from_u16(0xFCE0);
/// Current sensor values characteristic UUID (Read).
pub const CURRENT_READINGS_UUID: Uuid =
    Uuid::from_u128(0xf0cd1503_95da_4f4b_9ac8_aa55d312af0c);
/// Seconds since the last sensor update characteristic UUID (Read).
pub const SECONDS_SINCE_UPDATE_UUID: Uuid =
    Uuid::from_u128(0xf0cd2004_95da_4f4b_9ac8_aa55d312af0c);
/// Configured interval in seconds between sensor updates (Read).
pub const UPDATE_INTERVAL_UUID: Uuid =
    Uuid::from_u128(0xf0cd2002_95da_4f4b_9ac8_aa55d312af0c);
/// History command characteristic UUID (Write).
pub const HISTORY_COMMAND_UUID: Uuid =
    Uuid::from_u128(0xf0cd1402_95da_4f4b_9ac8_aa55d312af0c);
/// History data characteristic UUID (Read).
pub const HISTORY_DATA_UUID: Uuid =
    Uuid::from_u128(0xf0cd2005_95da_4f4b_9ac8_aa55d312af0c);

// Device Information Service (Standard BLE)
/// Standard BLE Device Information Service UUID.
pub const DEVICE_INFO_SERVICE_UUID: Uuid = bluetooth_uuid_from_u16(0x180a);
/// Manufacturer Name characteristic UUID.
pub const MANUFACTURER_NAME_UUID: Uuid = bluetooth_uuid_from_u16(0x2a29);
/// Model Number characteristic UUID.
pub const MODEL_NUMBER_UUID: Uuid = bluetooth_uuid_from_u16(0x2a24);
/// Serial Number characteristic UUID.
pub const SERIAL_NUMBER_UUID: Uuid = bluetooth_uuid_from_u16(0x2a25);
/// Hardware Revision characteristic UUID.
pub const HARDWARE_REVISION_UUID: Uuid = bluetooth_uuid_from_u16(0x2a27);
/// Software Revision characteristic UUID.
pub const SOFTWARE_REVISION_UUID: Uuid = bluetooth_uuid_from_u16(0x2a28);

// Battery Service (Standard BLE), listed as an optional service during
// device acquisition.
/// Standard BLE Battery Service UUID.
pub const BATTERY_SERVICE_UUID: Uuid = bluetooth_uuid_from_u16(0x180f);

/// Check if a service UUID is the Aranet custom sensor service.
pub fn is_sensor_service(uuid: &Uuid) -> bool {
    *uuid == SENSOR_SERVICE_UUID
}
