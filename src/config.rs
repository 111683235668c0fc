use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::path::PathBuf;
use std::time::Duration;

use agri_feed::{FeedOptions, OptionsError};

/// DynamoDB tables backing the remote sensor store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreTables {
    /// Sensors table name (partition key `id`)
    pub sensors_table: String,
    /// Sensor readings table name (partition key `id`)
    pub readings_table: String,
}

/// Configuration for the feed binary
#[derive(Debug, Clone)]
pub struct Config {
    /// Feed tuning (interval, history size, jitter, ...)
    pub feed: FeedOptions,
    /// Remote persistence, enabled when both table variables are set
    pub tables: Option<StoreTables>,
    /// JSON file seeding the sensor registry
    pub sensors_file: Option<PathBuf>,
}

impl Config {
    /// Create a new Config instance from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let feed = FeedOptions::from_lookup(&lookup)?;

        let tables = match (lookup("SENSORS_TABLE"), lookup("SENSOR_READINGS_TABLE")) {
            (Some(sensors_table), Some(readings_table)) => Some(StoreTables {
                sensors_table,
                readings_table,
            }),
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar(
                    "SENSOR_READINGS_TABLE".to_string(),
                ))
            }
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar("SENSORS_TABLE".to_string())),
            (None, None) => None,
        };

        let sensors_file = lookup("SENSORS_FILE").map(PathBuf::from);

        Ok(Config {
            feed,
            tables,
            sensors_file,
        })
    }
}

/// Build a DynamoDB client whose calls give up before the feed's own timeout
pub async fn dynamodb_client(operation_timeout: Duration) -> DynamoDbClient {
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;

    let dynamodb_config = aws_sdk_dynamodb::config::Builder::from(&aws_config)
        .timeout_config(
            aws_sdk_dynamodb::config::timeout::TimeoutConfig::builder()
                .operation_timeout(operation_timeout)
                .operation_attempt_timeout(operation_timeout / 2)
                .build(),
        )
        .build();

    DynamoDbClient::from_conf(dynamodb_config)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid feed options: {0}")]
    Options(#[from] OptionsError),
}
