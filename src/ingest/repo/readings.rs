use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use tracing::debug;

use mediciones_backend::{DocumentKey, DocumentStore, NormalizedReading, StoreError};

/// Partition key attribute of the readings table
pub const KEY_ATTRIBUTE: &str = "doc_id";

/// DynamoDB `TransactWriteItems` accepts at most 100 operations
pub const DYNAMODB_TRANSACTION_LIMIT: usize = 100;

/// Readings table backed by DynamoDB
///
/// Each chunk is written with one `TransactWriteItems` call made of plain
/// `Put` operations, so an existing item under the same key is replaced.
#[derive(Debug, Clone)]
pub struct DynamoReadingStore {
    client: DynamoDbClient,
    table: String,
}

impl DynamoReadingStore {
    pub fn new(client: DynamoDbClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for DynamoReadingStore {
    async fn commit(
        &self,
        documents: &[(DocumentKey, NormalizedReading)],
    ) -> Result<(), StoreError> {
        if documents.len() > DYNAMODB_TRANSACTION_LIMIT {
            return Err(StoreError::ChunkTooLarge {
                size: documents.len(),
                limit: DYNAMODB_TRANSACTION_LIMIT,
            });
        }

        let transact_items = documents
            .iter()
            .map(|(key, reading)| {
                let put = Put::builder()
                    .table_name(&self.table)
                    .set_item(Some(reading_to_item(key, reading)?))
                    .build()
                    .map_err(|e| StoreError::Transaction(format!("Failed to build Put: {}", e)))?;
                Ok(TransactWriteItem::builder().put(put).build())
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        debug!(
            table = %self.table,
            operations = transact_items.len(),
            "Sending TransactWriteItems"
        );

        self.client
            .transact_write_items()
            .set_transact_items(Some(transact_items))
            .send()
            .await
            .map_err(store_error_from_sdk)?;

        Ok(())
    }

    fn max_transaction_ops(&self) -> usize {
        DYNAMODB_TRANSACTION_LIMIT
    }
}

/// Convert a reading into a DynamoDB item keyed by `doc_id`
pub fn reading_to_item(
    key: &str,
    reading: &NormalizedReading,
) -> Result<HashMap<String, AttributeValue>, StoreError> {
    let mut item: HashMap<String, AttributeValue> =
        serde_dynamo::to_item(reading).map_err(|e| StoreError::Serialization(e.to_string()))?;
    item.insert(KEY_ATTRIBUTE.to_string(), AttributeValue::S(key.to_string()));
    Ok(item)
}

fn store_error_from_sdk(err: SdkError<TransactWriteItemsError>) -> StoreError {
    match &err {
        SdkError::ServiceError(service_err)
            if matches!(
                service_err.err(),
                TransactWriteItemsError::TransactionCanceledException(_)
            ) =>
        {
            StoreError::TransactionCancelled
        }
        _ => StoreError::Transaction(format!("{:?}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediciones_backend::{GeoPoint, Measurements};

    fn create_test_reading() -> NormalizedReading {
        NormalizedReading {
            latitude: 10.0,
            longitude: 20.0,
            timestamp: 1705316400,
            position_point: GeoPoint::new(10.0, 20.0),
            geohash: "s3y0zh7w1z".to_string(),
            measurements: Measurements {
                co2: Some(400.0),
                pm25: Some(12.5),
                ..Default::default()
            },
            device_label: "esp32".to_string(),
            original_identifier: Some("dir/f1.txt".to_string()),
            device_date_time: None,
            received_at: "2024-01-15T11:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_reading_to_item_sets_key() {
        let item = reading_to_item("dir_f1.txt", &create_test_reading()).unwrap();

        assert_eq!(item.get("doc_id").unwrap().as_s().unwrap(), "dir_f1.txt");
        assert_eq!(
            item.get("originalIdentifier").unwrap().as_s().unwrap(),
            "dir/f1.txt"
        );
    }

    #[test]
    fn test_reading_to_item_numeric_fields() {
        let item = reading_to_item("k", &create_test_reading()).unwrap();

        assert_eq!(item.get("latitude").unwrap().as_n().unwrap(), "10");
        assert_eq!(item.get("timestamp").unwrap().as_n().unwrap(), "1705316400");
        assert_eq!(item.get("co2").unwrap().as_n().unwrap(), "400");
        assert_eq!(item.get("pm25").unwrap().as_n().unwrap(), "12.5");
        assert!(item.get("geohash").unwrap().is_s());
    }

    #[test]
    fn test_reading_to_item_position_point_is_map() {
        let item = reading_to_item("k", &create_test_reading()).unwrap();

        let point = item.get("positionPoint").unwrap().as_m().unwrap();
        assert!(point.contains_key("latitude"));
        assert!(point.contains_key("longitude"));
    }

    #[test]
    fn test_reading_to_item_omits_absent_fields() {
        let item = reading_to_item("k", &create_test_reading()).unwrap();

        for field in ["co", "nh3", "no2", "pm10", "tvoc", "deviceDateTime"] {
            assert!(!item.contains_key(field), "{} should be omitted", field);
        }
    }

    #[tokio::test]
    async fn test_store_reports_dynamodb_limit() {
        let config = crate::config::Config::for_test("http://localhost:8000", "test-readings");
        let store = DynamoReadingStore::new(config.dynamodb_client, config.readings_table);

        assert_eq!(store.max_transaction_ops(), DYNAMODB_TRANSACTION_LIMIT);
        assert_eq!(mediciones_backend::chunk_size(&store), 100);
    }

    // Note: commits against a real table are exercised with DynamoDB Local
    // These unit tests verify the item conversion only
}
