use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::warn;

use crate::domain::{Sensor, SensorReading, SensorStatus};
use crate::error::StoreError;

/// Remote backend holding the sensors and readings tables
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Fetch every registered sensor
    async fn fetch_sensors(&self) -> Result<Vec<Sensor>, StoreError>;

    /// Record a sensor's latest status
    async fn update_sensor_status(
        &self,
        sensor_id: &str,
        status: SensorStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Append one reading to the readings table
    async fn insert_reading(&self, reading: &SensorReading) -> Result<(), StoreError>;
}

/// Run a store call with an upper bound on its duration
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// Dispatch a status update and a reading insert without waiting for them.
///
/// Each call is bounded by `limit`; failures are logged and dropped.
pub fn spawn_persist(
    store: Arc<dyn SensorStore>,
    reading: SensorReading,
    status: SensorStatus,
    limit: Duration,
) {
    tokio::spawn(async move {
        let sensor_id = reading.sensor_id.clone();

        if let Err(e) = with_timeout(
            limit,
            store.update_sensor_status(&sensor_id, status, reading.timestamp),
        )
        .await
        {
            warn!(
                sensor_id = %sensor_id,
                status = %status,
                error = %e,
                "Failed to persist sensor status"
            );
        }

        if let Err(e) = with_timeout(limit, store.insert_reading(&reading)).await {
            warn!(
                sensor_id = %sensor_id,
                reading_id = %reading.id,
                error = %e,
                "Failed to persist reading"
            );
        }
    });
}

/// In-process store that records every call
/// Can be told to fail or stall, for exercising the feed's error paths
#[derive(Debug, Default)]
pub struct MemoryStore {
    sensors: Mutex<Vec<Sensor>>,
    status_updates: Mutex<Vec<(String, SensorStatus, DateTime<Utc>)>>,
    readings: Mutex<Vec<SensorReading>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensors(sensors: Vec<Sensor>) -> Self {
        let store = Self::new();
        *lock(&store.sensors) = sensors;
        store
    }

    /// Make every subsequent call fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every subsequent call sleep before answering
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    pub fn status_updates(&self) -> Vec<(String, SensorStatus, DateTime<Utc>)> {
        lock(&self.status_updates).clone()
    }

    pub fn readings(&self) -> Vec<SensorReading> {
        lock(&self.readings).clone()
    }

    async fn gate(&self) -> Result<(), StoreError> {
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("memory store set to fail".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SensorStore for MemoryStore {
    async fn fetch_sensors(&self) -> Result<Vec<Sensor>, StoreError> {
        self.gate().await?;
        Ok(lock(&self.sensors).clone())
    }

    async fn update_sensor_status(
        &self,
        sensor_id: &str,
        status: SensorStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.gate().await?;
        lock(&self.status_updates).push((sensor_id.to_string(), status, at));
        Ok(())
    }

    async fn insert_reading(&self, reading: &SensorReading) -> Result<(), StoreError> {
        self.gate().await?;
        lock(&self.readings).push(reading.clone());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
