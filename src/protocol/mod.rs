//! Protocol module for characteristic payload decoding and history
//! command construction.

pub mod characteristics;
pub mod history;
pub mod readings;

pub use characteristics::{DecodedValue, SensorCharacteristic};
pub use history::{HistoryParam, HISTORY_CHUNK_SIZE};
pub use readings::CurrentReadings;
