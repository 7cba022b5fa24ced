//! Multi-characteristic read resolution.
//!
//! Reads a set of characteristics from one service in a single call and
//! decodes each payload with its kind's decode rule.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::ble::connection::ConnectionManager;
use crate::error::Result;
use crate::protocol::{DecodedValue, SensorCharacteristic};

/// Resolves a service and reads a batch of characteristics from it.
pub struct CharacteristicResolver<'a> {
    connection: &'a ConnectionManager,
}

impl<'a> CharacteristicResolver<'a> {
    /// Create a resolver over a connection manager.
    pub fn new(connection: &'a ConnectionManager) -> Self {
        Self { connection }
    }

    /// Read and decode every requested characteristic of a service.
    ///
    /// The reads are independent and issued concurrently; the result holds
    /// exactly one entry per requested kind regardless of completion order.
    /// Any single read or decode failure fails the whole call; no partial
    /// mapping is returned.
    pub async fn read_characteristics(
        &self,
        service: Uuid,
        kinds: &[SensorCharacteristic],
    ) -> Result<HashMap<SensorCharacteristic, DecodedValue>> {
        let session = self.connection.session().await?;

        debug!("Reading {} characteristics from service {}", kinds.len(), service);

        let reads = kinds.iter().map(|kind| {
            let session = session.clone();
            async move {
                let raw = session.read_value(service, kind.uuid()).await?;
                let value = kind.decode(&raw)?;
                Ok::<_, crate::error::Error>((*kind, value))
            }
        });

        let entries = futures::future::try_join_all(reads).await?;

        Ok(entries.into_iter().collect())
    }
}
