// Live feed binary entry point

mod config;
mod repo;

use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use agri_feed::{
    with_timeout, Clock, FeedSnapshot, LiveFeed, SensorRegistry, SensorStore, SystemClock,
};
use config::Config;
use repo::DynamoSensorStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let clock = Arc::new(SystemClock::new());

    let seed = seed_registry(&config, clock.now())?;

    let store: Option<Arc<dyn SensorStore>> = match &config.tables {
        Some(tables) => {
            let client = config::dynamodb_client(config.feed.persist_timeout).await;
            info!(
                sensors_table = %tables.sensors_table,
                readings_table = %tables.readings_table,
                "DynamoDB persistence enabled"
            );
            Some(Arc::new(DynamoSensorStore::new(client, tables.clone())))
        }
        None => {
            info!("No store tables configured, running simulation only");
            None
        }
    };

    let registry = match &store {
        Some(store) => initial_registry(store.as_ref(), seed, config.feed.persist_timeout).await,
        None => seed,
    };

    let mut feed = LiveFeed::new(config.feed.clone(), registry)?.with_clock(clock);
    if let Some(store) = store {
        feed = feed.with_store(store);
    }

    let handle = feed.start();
    let reporter = tokio::spawn(report(handle.subscribe()));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    let last = handle.stop().await;
    // the reporter ends once the feed's sender is gone
    if let Err(e) = reporter.await {
        warn!(error = %e, "Snapshot reporter ended abnormally");
    }

    info!(ticks = last.tick, "Live feed shut down");
    Ok(())
}

/// Registry from SENSORS_FILE, or the demo site when unset
fn seed_registry(config: &Config, now: DateTime<Utc>) -> anyhow::Result<SensorRegistry> {
    match &config.sensors_file {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read sensors file {}", path.display()))?;
            let registry = SensorRegistry::load_json(&bytes)
                .with_context(|| format!("Failed to parse sensors file {}", path.display()))?;
            info!(path = %path.display(), sensors = registry.len(), "Loaded sensor registry");
            Ok(registry)
        }
        None => Ok(SensorRegistry::default_site(now)),
    }
}

/// Fetch the registry from the store, falling back to `seed`
async fn initial_registry(
    store: &dyn SensorStore,
    seed: SensorRegistry,
    limit: Duration,
) -> SensorRegistry {
    match with_timeout(limit, store.fetch_sensors()).await {
        Ok(sensors) if !sensors.is_empty() => {
            info!(sensors = sensors.len(), "Fetched sensor registry from store");
            SensorRegistry::from_sensors(sensors)
        }
        Ok(_) => {
            warn!("Store returned no sensors, using local registry");
            seed
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch sensors, using local registry");
            seed
        }
    }
}

/// Log every published snapshot until the feed stops
async fn report(mut snapshots: watch::Receiver<Arc<FeedSnapshot>>) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();

        if !snapshot.connected {
            warn!(tick = snapshot.tick, "Sensor link down (simulated)");
        }

        for (metric, value) in snapshot.values.iter() {
            info!(
                tick = snapshot.tick,
                metric = %metric,
                value = *value,
                unit = metric.unit(),
                status = %snapshot.statuses.get(metric),
                trend = *snapshot.trends.get(metric),
                "{}",
                metric.profile().label
            );
        }

        match snapshot.to_json() {
            Ok(json) => debug!(snapshot = %json, "Published snapshot"),
            Err(e) => warn!(error = %e, "Failed to serialize snapshot"),
        }
    }
}
