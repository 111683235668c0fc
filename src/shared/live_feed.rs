//! Periodic driver that advances the simulated sensors.
//!
//! A [`LiveFeed`] owns all mutable feed state: current values, per-metric
//! history, the sensor registry, the random source and the connection flag.
//! [`LiveFeed::start`] moves it onto a tokio task that ticks on a fixed
//! interval and publishes an immutable [`FeedSnapshot`] after every tick.
//! Readers hold a [`FeedHandle`] or a `watch` receiver and never block the
//! driver.
//!
//! Remote persistence is dispatched with `tokio::spawn` and never awaited by
//! the tick; a failing or slow store only produces log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::classifier::classify;
use crate::domain::{GeoPoint, Sensor, SensorReading, SensorStatus, SITE_LOCATION};
use crate::error::OptionsError;
use crate::history::{HistoricalSeries, Reading};
use crate::id_generator::{IdGenerator, RandomIdGenerator};
use crate::metric::{Metric, PerMetric};
use crate::options::FeedOptions;
use crate::registry::SensorRegistry;
use crate::simulator::ValueSimulator;
use crate::store::{spawn_persist, with_timeout, SensorStore};
use crate::time::{Clock, SystemClock};

/// Read-only view of the feed after a tick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedSnapshot {
    /// Ticks completed so far; zero before the first tick
    pub tick: u64,
    pub connected: bool,
    /// Timestamp of the latest tick, or of feed creation before the first tick
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    pub values: PerMetric<f64>,
    pub statuses: PerMetric<SensorStatus>,
    /// Latest value minus the one before it
    pub trends: PerMetric<f64>,
    pub history: PerMetric<HistoricalSeries>,
    pub sensors: Vec<Sensor>,
}

impl FeedSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Simulated sensor feed, not yet running
pub struct LiveFeed {
    options: FeedOptions,
    simulator: ValueSimulator,
    registry: SensorRegistry,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    store: Option<Arc<dyn SensorStore>>,
    values: PerMetric<f64>,
    history: PerMetric<HistoricalSeries>,
    connected: bool,
    ticks: u64,
    created_at: DateTime<Utc>,
    last_tick_at: Option<DateTime<Utc>>,
}

impl LiveFeed {
    pub fn new(options: FeedOptions, registry: SensorRegistry) -> Result<Self, OptionsError> {
        options.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let created_at = clock.now();

        Ok(Self {
            simulator: ValueSimulator::from_seed_opt(options.seed),
            values: PerMetric::from_fn(|m| m.profile().initial),
            history: PerMetric::from_fn(|_| HistoricalSeries::with_capacity(options.max_points)),
            options,
            registry,
            clock,
            ids: Arc::new(RandomIdGenerator::new()),
            store: None,
            connected: true,
            ticks: 0,
            created_at,
            last_tick_at: None,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.created_at = clock.now();
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Persist every tick to `store`
    pub fn with_store(mut self, store: Arc<dyn SensorStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Run one tick in place and return the resulting snapshot.
    ///
    /// With a store attached this spawns persistence tasks and so must be
    /// called from within a tokio runtime.
    pub fn tick(&mut self) -> FeedSnapshot {
        self.ticks += 1;

        if self.options.jitter {
            // re-drawn every tick so a drop lasts exactly one tick
            self.connected = !self.simulator.chance(self.options.jitter_probability);
        }

        let now = match self.last_tick_at {
            Some(last) => self.clock.now().max(last),
            None => self.clock.now(),
        };
        self.last_tick_at = Some(now);

        for metric in Metric::ALL {
            let value = self.simulator.next_for(metric, *self.values.get(metric));
            *self.values.get_mut(metric) = value;

            let status = classify(metric, value);
            self.history
                .get_mut(metric)
                .append(Reading { timestamp: now, value });
            self.record(metric, value, status, now);
        }

        debug!(
            tick = self.ticks,
            connected = self.connected,
            temperature = self.values.temperature,
            humidity = self.values.humidity,
            soil_moisture = self.values.soil_moisture,
            light = self.values.light,
            "Feed tick"
        );

        self.snapshot()
    }

    /// Apply a status to every sensor of `metric` and hand it to the store
    fn record(&mut self, metric: Metric, value: f64, status: SensorStatus, at: DateTime<Utc>) {
        let sensor_ids: Vec<String> = self
            .registry
            .of_metric(metric)
            .map(|s| s.id.clone())
            .collect();

        for sensor_id in sensor_ids {
            self.registry.update_status(&sensor_id, status, at);

            if let Some(store) = &self.store {
                let reading = SensorReading {
                    id: self.ids.uuid_v4(),
                    sensor_id,
                    value,
                    unit: metric.unit().to_string(),
                    timestamp: at,
                    created_at: at,
                };
                spawn_persist(store.clone(), reading, status, self.options.persist_timeout);
            }
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            tick: self.ticks,
            connected: self.connected,
            timestamp: self.last_tick_at.unwrap_or(self.created_at),
            location: SITE_LOCATION,
            values: self.values.clone(),
            statuses: PerMetric::from_fn(|m| classify(m, *self.values.get(m))),
            trends: PerMetric::from_fn(|m| self.history.get(m).trend()),
            history: self.history.clone(),
            sensors: self.registry.list().to_vec(),
        }
    }

    /// Merge a fetched sensor list and mark silent sensors offline
    pub fn apply_refresh(&mut self, sensors: Vec<Sensor>) {
        let fetched = sensors.len();
        self.registry.merge(sensors);

        let window = chrono::Duration::from_std(self.options.offline_after)
            .unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));
        let offline = self.registry.sweep_offline(self.clock.now(), window);

        info!(
            fetched = fetched,
            registered = self.registry.len(),
            marked_offline = offline,
            "Sensor registry refreshed"
        );
    }

    /// Start a background fetch if this tick is due for a registry refresh
    fn maybe_refresh(&self, results: &mpsc::Sender<Vec<Sensor>>) {
        let (Some(store), Some(every)) = (&self.store, self.options.refresh_every) else {
            return;
        };
        if every == 0 || self.ticks % every != 0 {
            return;
        }

        let store = store.clone();
        let results = results.clone();
        let limit = self.options.persist_timeout;
        tokio::spawn(async move {
            match with_timeout(limit, store.fetch_sensors()).await {
                Ok(sensors) => {
                    if results.send(sensors).await.is_err() {
                        debug!("Feed stopped before registry refresh arrived");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to refresh sensor registry"),
            }
        });
    }

    /// Move the feed onto a background task ticking every `options.interval`.
    ///
    /// The first tick fires one interval after start.
    pub fn start(self) -> FeedHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(self.snapshot()));
        let task = tokio::spawn(self.run(stop_rx, snapshot_tx));

        FeedHandle {
            stop: Some(stop_tx),
            task,
            snapshots: snapshot_rx,
        }
    }

    async fn run(
        mut self,
        mut stop: oneshot::Receiver<()>,
        publish: watch::Sender<Arc<FeedSnapshot>>,
    ) -> FeedSnapshot {
        let period = self.options.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<Vec<Sensor>>(1);

        info!(
            interval_ms = period.as_millis() as u64,
            max_points = self.options.max_points,
            jitter = self.options.jitter,
            persistence = self.store.is_some(),
            sensors = self.registry.len(),
            "Live feed started"
        );

        loop {
            tokio::select! {
                biased;

                // fires on an explicit stop and when the handle is dropped
                _ = &mut stop => break,

                _ = ticker.tick() => {
                    let snapshot = self.tick();
                    self.maybe_refresh(&refresh_tx);
                    publish.send_replace(Arc::new(snapshot));
                }

                Some(sensors) = refresh_rx.recv() => {
                    self.apply_refresh(sensors);
                    publish.send_replace(Arc::new(self.snapshot()));
                }
            }
        }

        info!(ticks = self.ticks, "Live feed stopped");
        self.snapshot()
    }
}

/// Handle to a running feed. Dropping it stops the feed.
pub struct FeedHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<FeedSnapshot>,
    snapshots: watch::Receiver<Arc<FeedSnapshot>>,
}

impl FeedHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every tick
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.snapshots.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop ticking and return the final state.
    ///
    /// Persistence calls already dispatched keep running in the background.
    pub async fn stop(mut self) -> Arc<FeedSnapshot> {
        if let Some(stop) = self.stop.take() {
            // the task may already be gone; the join below reports that
            let _ = stop.send(());
        }

        match (&mut self.task).await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                error!(error = %e, "Live feed task ended abnormally");
                self.snapshot()
            }
        }
    }
}
