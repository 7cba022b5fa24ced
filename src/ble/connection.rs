//! Connection lifecycle management.
//!
//! Owns the single session to the sensor: lazily acquires a device on
//! first use, hands the cached session back while it stays connected, and
//! replaces it after any teardown.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ble::transport::{DeviceFilter, GattSession, GattTransport};
use crate::error::{Error, Result};

/// Manages the connection to a single sensor device.
///
/// A connect attempt is a single shared in-flight operation: the session
/// slot's async mutex is held across acquisition, so a second caller
/// arriving mid-connect awaits the same outcome instead of triggering a
/// second acquisition against the same physical device.
pub struct ConnectionManager {
    transport: Arc<dyn GattTransport>,
    filter: DeviceFilter,
    session: Mutex<Option<Arc<dyn GattSession>>>,
}

impl ConnectionManager {
    /// Create a manager over a transport with the default device filter.
    pub fn new(transport: Arc<dyn GattTransport>) -> Self {
        Self::with_filter(transport, DeviceFilter::default())
    }

    /// Create a manager with a specific device filter.
    pub fn with_filter(transport: Arc<dyn GattTransport>, filter: DeviceFilter) -> Self {
        Self {
            transport,
            filter,
            session: Mutex::new(None),
        }
    }

    /// Check if a session exists and is currently connected.
    pub async fn is_connected(&self) -> bool {
        match self.session.lock().await.as_ref() {
            Some(session) => session.is_connected().await,
            None => false,
        }
    }

    /// Get the current session, connecting if necessary.
    ///
    /// Returns the existing handle without any radio activity when it is
    /// still connected. Otherwise performs device acquisition and link
    /// establishment, stores the new handle, and returns it. Failures are
    /// surfaced as [`Error::ConnectionFailed`] and never retried here.
    pub async fn session(&self) -> Result<Arc<dyn GattSession>> {
        let mut slot = self.session.lock().await;

        if let Some(session) = slot.as_ref() {
            if session.is_connected().await {
                return Ok(session.clone());
            }
            debug!("Cached session no longer connected, reacquiring");
            *slot = None;
        }

        info!("Acquiring sensor device");

        let session = self
            .transport
            .acquire_device(&self.filter)
            .await
            .map_err(|e| match e {
                Error::ConnectionFailed { .. } => e,
                other => Error::ConnectionFailed {
                    reason: other.to_string(),
                },
            })?;

        *slot = Some(session.clone());

        Ok(session)
    }

    /// Tear down the current session, if any.
    ///
    /// The next [`session`](Self::session) call performs a fresh acquisition.
    pub async fn disconnect(&self) -> Result<()> {
        let mut slot = self.session.lock().await;

        if let Some(session) = slot.take() {
            info!("Disconnecting sensor session");
            if let Err(e) = session.disconnect().await {
                warn!("Disconnect failed: {}", e);
                return Err(e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    #[tokio::test]
    async fn concurrent_callers_share_one_acquisition() {
        let transport = Arc::new(MockTransport::new().with_acquire_latency_ms(50));
        let manager = Arc::new(ConnectionManager::new(transport.clone()));

        let a = manager.clone();
        let b = manager.clone();
        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.session().await }),
            tokio::spawn(async move { b.session().await }),
        );

        let first = first.unwrap().unwrap();
        let second = second.unwrap().unwrap();

        assert_eq!(transport.acquire_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn connected_session_is_reused_without_acquisition() {
        let transport = Arc::new(MockTransport::new());
        let manager = ConnectionManager::new(transport.clone());

        let first = manager.session().await.unwrap();
        let second = manager.session().await.unwrap();

        assert_eq!(transport.acquire_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(manager.is_connected().await);
    }

    #[tokio::test]
    async fn teardown_forces_fresh_acquisition() {
        let transport = Arc::new(MockTransport::new());
        let manager = ConnectionManager::new(transport.clone());

        let first = manager.session().await.unwrap();
        manager.disconnect().await.unwrap();
        assert!(!manager.is_connected().await);

        let second = manager.session().await.unwrap();
        assert_eq!(transport.acquire_count(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn acquisition_failure_surfaces_connection_failed() {
        let transport = Arc::new(MockTransport::new().with_acquire_failure());
        let manager = ConnectionManager::new(transport);

        let err = manager.session().await.err().unwrap();
        assert!(matches!(err, Error::ConnectionFailed { .. }));
    }
}
