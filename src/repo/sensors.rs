use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::warn;

use agri_feed::{Sensor, SensorStatus, StoreError};

/// Scan every sensor in the sensors table
///
/// Follows `LastEvaluatedKey` until the table is exhausted. Rows that do not
/// decode into a [`Sensor`] (for example an unknown `type`) are skipped with a
/// warning rather than failing the whole fetch.
///
/// # Arguments
/// * `client` - DynamoDB client
/// * `table_name` - Name of the sensors table
///
/// # Returns
/// * `Ok(Vec<Sensor>)` - Every decodable sensor
/// * `Err(StoreError)` - DynamoDB error occurred
pub async fn scan_sensors(
    client: &DynamoDbClient,
    table_name: &str,
) -> Result<Vec<Sensor>, StoreError> {
    let mut sensors = Vec::new();
    let mut start_key: Option<HashMap<String, AttributeValue>> = None;

    loop {
        let output = client
            .scan()
            .table_name(table_name)
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))?;

        for item in output.items.unwrap_or_default() {
            match item_to_sensor(item) {
                Ok(sensor) => sensors.push(sensor),
                Err(e) => warn!(table = %table_name, error = %e, "Skipping undecodable sensor row"),
            }
        }

        match output.last_evaluated_key {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => break,
        }
    }

    Ok(sensors)
}

/// Set a sensor's status and updated_at
///
/// The update is conditional on the sensor existing, so a status for a sensor
/// deleted remotely fails instead of creating a partial row.
///
/// # Arguments
/// * `client` - DynamoDB client
/// * `table_name` - Name of the sensors table
/// * `sensor_id` - Sensor id (partition key)
/// * `status` - New status
/// * `at` - Time of the reading that produced the status
pub async fn update_sensor_status(
    client: &DynamoDbClient,
    table_name: &str,
    sensor_id: &str,
    status: SensorStatus,
    at: DateTime<Utc>,
) -> Result<(), StoreError> {
    client
        .update_item()
        .table_name(table_name)
        .key("id", AttributeValue::S(sensor_id.to_string()))
        .update_expression("SET #status = :status, updated_at = :updated_at")
        .condition_expression("attribute_exists(id)")
        // status is a DynamoDB reserved word
        .expression_attribute_names("#status", "status")
        .expression_attribute_values(":status", AttributeValue::S(status.as_str().to_string()))
        .expression_attribute_values(":updated_at", AttributeValue::S(at.to_rfc3339()))
        .send()
        .await
        .map_err(|e| StoreError::Backend(format!("{:?}", e)))?;

    Ok(())
}

/// Convert a DynamoDB item to a Sensor struct
pub fn item_to_sensor(item: HashMap<String, AttributeValue>) -> Result<Sensor, StoreError> {
    serde_dynamo::from_item(item).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_feed::Metric;

    fn sensor_item(metric: &str) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S("3".to_string()));
        item.insert(
            "name".to_string(),
            AttributeValue::S("Sensor C - Rice Field".to_string()),
        );
        item.insert("type".to_string(), AttributeValue::S(metric.to_string()));
        item.insert("location_lat".to_string(), AttributeValue::N("-8.66".to_string()));
        item.insert("location_lng".to_string(), AttributeValue::N("115.2".to_string()));
        item.insert("status".to_string(), AttributeValue::S("critical".to_string()));
        item.insert(
            "created_at".to_string(),
            AttributeValue::S("2024-01-15T10:30:00Z".to_string()),
        );
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S("2024-01-15T10:35:00+00:00".to_string()),
        );
        item
    }

    #[test]
    fn test_item_to_sensor() {
        let sensor = item_to_sensor(sensor_item("soil_moisture")).unwrap();
        assert_eq!(sensor.id, "3");
        assert_eq!(sensor.metric, Metric::SoilMoisture);
        assert_eq!(sensor.status, SensorStatus::Critical);
        assert_eq!(sensor.location_lat, -8.66);
        assert_eq!(sensor.updated_at.timestamp(), 1705314900);
    }

    #[test]
    fn test_item_with_unknown_type_fails() {
        let result = item_to_sensor(sensor_item("pressure"));
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_item_missing_field_fails() {
        let mut item = sensor_item("light");
        item.remove("name");
        assert!(item_to_sensor(item).is_err());
    }
}
