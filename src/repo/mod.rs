pub mod readings;
pub mod sensors;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::{DateTime, Utc};

use agri_feed::{Sensor, SensorReading, SensorStatus, SensorStore, StoreError};

use crate::config::StoreTables;

/// SensorStore backed by the DynamoDB sensors and readings tables
#[derive(Debug, Clone)]
pub struct DynamoSensorStore {
    client: DynamoDbClient,
    tables: StoreTables,
}

impl DynamoSensorStore {
    pub fn new(client: DynamoDbClient, tables: StoreTables) -> Self {
        Self { client, tables }
    }
}

#[async_trait]
impl SensorStore for DynamoSensorStore {
    async fn fetch_sensors(&self) -> Result<Vec<Sensor>, StoreError> {
        sensors::scan_sensors(&self.client, &self.tables.sensors_table).await
    }

    async fn update_sensor_status(
        &self,
        sensor_id: &str,
        status: SensorStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sensors::update_sensor_status(
            &self.client,
            &self.tables.sensors_table,
            sensor_id,
            status,
            at,
        )
        .await
    }

    async fn insert_reading(&self, reading: &SensorReading) -> Result<(), StoreError> {
        readings::put_reading(&self.client, &self.tables.readings_table, reading).await
    }
}
