use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;

use agri_feed::{SensorReading, StoreError};

/// Write one reading to the readings table
///
/// Reading ids are fresh UUIDs, so the put is unconditional.
pub async fn put_reading(
    client: &DynamoDbClient,
    table_name: &str,
    reading: &SensorReading,
) -> Result<(), StoreError> {
    let item = reading_to_item(reading)?;

    client
        .put_item()
        .table_name(table_name)
        .set_item(Some(item))
        .send()
        .await
        .map_err(|e| StoreError::Backend(format!("{:?}", e)))?;

    Ok(())
}

/// Convert a SensorReading to a DynamoDB item
pub fn reading_to_item(
    reading: &SensorReading,
) -> Result<HashMap<String, AttributeValue>, StoreError> {
    serde_dynamo::to_item(reading).map_err(|e| StoreError::Serialization(e.to_string()))
}
