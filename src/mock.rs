//! Mock transport for testing.
//!
//! Provides a scripted [`GattTransport`]/[`GattSession`] pair that can be
//! used for unit and integration testing without BLE hardware.
//!
//! # Features
//!
//! - Programmable characteristic payloads per (service, characteristic)
//! - A history simulator that answers paging commands from a per-parameter
//!   sample store, serving an empty payload once a stream is exhausted
//! - Failure injection (acquisition failure, fail-after-N session operations)
//! - Latency injection (acquisition latency, per-parameter read stalls)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::ble::transport::{DeviceFilter, GattSession, GattTransport};
use crate::ble::uuids::{HISTORY_COMMAND_UUID, HISTORY_DATA_UUID, SENSOR_SERVICE_UUID};
use crate::error::{Error, Result};
use crate::protocol::HistoryParam;

#[derive(Default)]
struct MockState {
    /// Scripted single-shot read payloads.
    characteristics: RwLock<HashMap<(Uuid, Uuid), Vec<u8>>>,
    /// Per-parameter history sample stores, keyed by wire parameter id.
    history: RwLock<HashMap<u8, Vec<u16>>>,
    /// Response staged by the most recent history command.
    pending_history: Mutex<Option<(u8, Vec<u8>)>>,
    /// Log of all payloads written to the history command characteristic.
    command_log: Mutex<Vec<Vec<u8>>>,
    acquire_count: AtomicU32,
    acquire_latency_ms: AtomicU64,
    fail_acquire: AtomicBool,
    /// Session operations remaining before an injected transport failure;
    /// negative means disabled.
    ops_until_failure: AtomicI64,
    /// Read stall for one parameter's history data, (wire id, millis).
    stall: RwLock<Option<(u8, u64)>>,
}

/// A scripted transport serving [`MockSession`]s.
pub struct MockTransport {
    state: Arc<MockState>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a mock transport with no scripted data.
    pub fn new() -> Self {
        let state = MockState {
            ops_until_failure: AtomicI64::new(-1),
            ..Default::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Delay each acquisition by the given number of milliseconds.
    pub fn with_acquire_latency_ms(self, millis: u64) -> Self {
        self.state
            .acquire_latency_ms
            .store(millis, Ordering::Relaxed);
        self
    }

    /// Make every acquisition attempt fail.
    pub fn with_acquire_failure(self) -> Self {
        self.state.fail_acquire.store(true, Ordering::Relaxed);
        self
    }

    /// Script the payload returned for a characteristic read.
    pub fn set_characteristic(&self, service: Uuid, characteristic: Uuid, payload: Vec<u8>) {
        self.state
            .characteristics
            .write()
            .insert((service, characteristic), payload);
    }

    /// Script a parameter's full history sample store.
    pub fn set_history(&self, param: HistoryParam, samples: Vec<u16>) {
        self.state.history.write().insert(param as u8, samples);
    }

    /// Stall history data reads for one parameter by the given duration.
    pub fn stall_history_param(&self, param: HistoryParam, delay: Duration) {
        *self.state.stall.write() = Some((param as u8, delay.as_millis() as u64));
    }

    /// Inject a transport failure after `n` further session operations.
    pub fn fail_after_operations(&self, n: u32) {
        self.state
            .ops_until_failure
            .store(i64::from(n), Ordering::SeqCst);
    }

    /// Number of acquisitions performed so far.
    pub fn acquire_count(&self) -> u32 {
        self.state.acquire_count.load(Ordering::SeqCst)
    }

    /// All payloads written to the history command characteristic.
    pub fn command_log(&self) -> Vec<Vec<u8>> {
        self.state.command_log.lock().clone()
    }
}

#[async_trait]
impl GattTransport for MockTransport {
    async fn acquire_device(&self, _filter: &DeviceFilter) -> Result<Arc<dyn GattSession>> {
        let latency = self.state.acquire_latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        self.state.acquire_count.fetch_add(1, Ordering::SeqCst);

        if self.state.fail_acquire.load(Ordering::Relaxed) {
            return Err(Error::ConnectionFailed {
                reason: "mock acquisition failure".to_string(),
            });
        }

        Ok(Arc::new(MockSession {
            state: self.state.clone(),
            connected: AtomicBool::new(true),
        }))
    }
}

/// A session handed out by [`MockTransport`].
pub struct MockSession {
    state: Arc<MockState>,
    connected: AtomicBool,
}

impl MockSession {
    fn check_op(&self) -> Result<()> {
        let remaining = self.state.ops_until_failure.load(Ordering::SeqCst);
        if remaining < 0 {
            return Ok(());
        }
        if remaining == 0 {
            // One-shot rejection; subsequent operations succeed again.
            self.state.ops_until_failure.store(-1, Ordering::SeqCst);
            return Err(Error::Transport {
                context: "injected failure".to_string(),
            });
        }
        self.state.ops_until_failure.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    /// Slice the scripted sample store per a paging command and encode the
    /// window with the parameter's sample width.
    fn stage_history_response(&self, command: &[u8]) -> Result<()> {
        if command.len() != 5 {
            return Err(Error::Transport {
                context: format!("malformed history command: {} bytes", command.len()),
            });
        }

        let param_id = command[0];
        let offset = u16::from_le_bytes([command[1], command[2]]) as usize;
        let count = u16::from_le_bytes([command[3], command[4]]) as usize;

        if offset == 0 {
            return Err(Error::Transport {
                context: "history offset is 1-based, got 0".to_string(),
            });
        }

        let history = self.state.history.read();
        let samples = history.get(&param_id).map(Vec::as_slice).unwrap_or(&[]);

        let start = (offset - 1).min(samples.len());
        let end = (start + count).min(samples.len());
        let window = &samples[start..end];

        let one_byte_samples = param_id == HistoryParam::Humidity as u8;
        let mut payload = Vec::with_capacity(window.len() * if one_byte_samples { 1 } else { 2 });
        for sample in window {
            if one_byte_samples {
                payload.push(*sample as u8);
            } else {
                payload.extend_from_slice(&sample.to_le_bytes());
            }
        }

        *self.state.pending_history.lock() = Some((param_id, payload));
        Ok(())
    }
}

#[async_trait]
impl GattSession for MockSession {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn read_value(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>> {
        self.check_op()?;

        if service == SENSOR_SERVICE_UUID && characteristic == HISTORY_DATA_UUID {
            let staged = self.state.pending_history.lock().take();
            let (param_id, payload) = staged.unwrap_or((0, Vec::new()));

            let stall = *self.state.stall.read();
            if let Some((stalled_param, millis)) = stall {
                if stalled_param == param_id {
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                }
            }

            return Ok(payload);
        }

        self.state
            .characteristics
            .read()
            .get(&(service, characteristic))
            .cloned()
            .ok_or(Error::CharacteristicNotFound {
                uuid: characteristic,
            })
    }

    async fn write_value(&self, service: Uuid, characteristic: Uuid, data: &[u8]) -> Result<()> {
        self.check_op()?;

        if service == SENSOR_SERVICE_UUID && characteristic == HISTORY_COMMAND_UUID {
            self.state.command_log.lock().push(data.to_vec());
            return self.stage_history_response(data);
        }

        Err(Error::CharacteristicNotFound {
            uuid: characteristic,
        })
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
