//! Error types for the aranet-rust-ble crate.

use thiserror::Error;
use uuid::Uuid;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// Operation requires a connection but no session is established.
    #[error("Sensor not connected")]
    NotConnected,

    /// Device acquisition or link establishment failed. Not retried.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Service not found on the device.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The UUID of the service that was not found.
        uuid: Uuid,
    },

    /// Characteristic not found within the resolved service.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: Uuid,
    },

    /// A characteristic payload could not be decoded.
    ///
    /// Aborts the enclosing multi-characteristic read; no partial result
    /// mapping is produced.
    #[error("Decode failed for characteristic {characteristic}: {context}")]
    DecodeFailed {
        /// The characteristic whose payload was malformed.
        characteristic: Uuid,
        /// Description of what was wrong with the payload.
        context: String,
    },

    /// A read or write was rejected by the transport mid-operation.
    #[error("Transport error: {context}")]
    Transport {
        /// Description of the rejected operation.
        context: String,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
