use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::time::Duration;

use mediciones_backend::DEFAULT_DEVICE_LABEL;

/// Configuration for the ingestion API
///
/// Loaded once at cold start and shared by every invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB client
    pub dynamodb_client: DynamoDbClient,
    /// Readings table name
    pub readings_table: String,
    /// CORS allowed origin
    pub cors_allowed_origin: String,
    /// Device label used when a reading carries none
    pub default_device_label: String,
}

impl Config {
    /// Create a new Config instance from environment variables
    pub async fn from_env() -> Result<Self, ConfigError> {
        // Load AWS configuration with behavior version
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;

        // Create DynamoDB client with appropriate timeouts
        let dynamodb_config = aws_sdk_dynamodb::config::Builder::from(&aws_config)
            .timeout_config(
                aws_sdk_dynamodb::config::timeout::TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(25)) // Leave 5s buffer for Lambda timeout
                    .operation_attempt_timeout(Duration::from_secs(10))
                    .build(),
            )
            .build();

        let dynamodb_client = DynamoDbClient::from_conf(dynamodb_config);

        let readings_table = std::env::var("READINGS_TABLE")
            .map_err(|_| ConfigError::MissingEnvVar("READINGS_TABLE".to_string()))?;

        let cors_allowed_origin =
            std::env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string());

        let default_device_label = std::env::var("DEFAULT_DEVICE_LABEL")
            .ok()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| DEFAULT_DEVICE_LABEL.to_string());

        Ok(Config {
            dynamodb_client,
            readings_table,
            cors_allowed_origin,
            default_device_label,
        })
    }

    /// Create a test configuration pointing at a local endpoint
    /// This is useful for integration tests with DynamoDB Local
    #[cfg(test)]
    pub fn for_test(endpoint_url: &str, readings_table: &str) -> Self {
        use aws_sdk_dynamodb::config::{Credentials, Region};

        let credentials =
            Credentials::new("test_access_key", "test_secret_key", None, None, "test");

        let dynamodb_config = aws_sdk_dynamodb::config::Builder::new()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(endpoint_url)
            .timeout_config(
                aws_sdk_dynamodb::config::timeout::TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(10))
                    .operation_attempt_timeout(Duration::from_secs(5))
                    .build(),
            )
            .build();

        Config {
            dynamodb_client: DynamoDbClient::from_conf(dynamodb_config),
            readings_table: readings_table.to_string(),
            cors_allowed_origin: "*".to_string(),
            default_device_label: DEFAULT_DEVICE_LABEL.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}
