//! DynamoDB record store
//!
//! Maps the record store contract onto the AWS SDK:
//! - `put` -> PutItem (full replace)
//! - `get` -> GetItem
//! - `merge` -> UpdateItem with a SET expression per field
//! - `scan` -> Scan with a page limit (unordered, no cursor)
//! - `scan_newest` -> Query on a constant-partition GSI sorted by timestamp
//!
//! Every item is written with a `kind` attribute naming its collection; the
//! timestamp index partitions on `kind` and sorts on `timestamp`, which is
//! what makes the ordered query possible on a key-value table.

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{Collection, RecordStore};
use crate::config::StoreConfig;
use crate::errors::{AppError, Result};

/// Attribute carrying the collection name, used as the index partition key.
const KIND_ATTR: &str = "kind";

/// DynamoDB-backed record store.
pub struct DynamoStore {
    client: Client,
    config: StoreConfig,
}

impl DynamoStore {
    /// Create a new store client.
    ///
    /// When `store.endpoint` is set (DynamoDB Local), the client is pointed
    /// at it; otherwise the default AWS endpoint resolution applies.
    pub async fn new(config: StoreConfig) -> Result<Self> {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_types::region::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&aws_config);
        if let Some(ref endpoint) = config.endpoint {
            tracing::info!(endpoint = %endpoint, "Using DynamoDB endpoint override");
            builder = builder.endpoint_url(endpoint.as_str());
        }

        let client = Client::from_conf(builder.build());
        Ok(Self { client, config })
    }

    /// Create with an existing client (used by tests against DynamoDB Local).
    pub fn with_client(client: Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    fn table_name(&self, collection: Collection) -> &str {
        match collection {
            Collection::Papers => &self.config.papers_table,
            Collection::Searches => &self.config.searches_table,
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for DynamoStore {
    async fn put(&self, collection: Collection, key: &str, item: Value) -> Result<()> {
        let table = self.table_name(collection);
        let mut attrs = item_to_attributes(item)?;
        attrs.insert(
            collection.key_attribute().to_string(),
            AttributeValue::S(key.to_string()),
        );
        attrs.insert(
            KIND_ATTR.to_string(),
            AttributeValue::S(collection.kind().to_string()),
        );

        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(attrs))
            .send()
            .await
            .map_err(|e| AppError::Store {
                message: format!("Failed to put item in '{}': {}", table, e),
            })?;

        tracing::debug!(table, key, "Record written");
        Ok(())
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        let table = self.table_name(collection);

        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(
                collection.key_attribute(),
                AttributeValue::S(key.to_string()),
            )
            .send()
            .await
            .map_err(|e| AppError::Store {
                message: format!("Failed to get item from '{}': {}", table, e),
            })?;

        Ok(output.item.map(attributes_to_item))
    }

    async fn merge(
        &self,
        collection: Collection,
        key: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let table = self.table_name(collection);

        // SET #f0 = :v0, #f1 = :v1, ...
        let mut update = self
            .client
            .update_item()
            .table_name(table)
            .key(
                collection.key_attribute(),
                AttributeValue::S(key.to_string()),
            );

        let mut clauses = Vec::with_capacity(fields.len());
        for (i, (name, value)) in fields.into_iter().enumerate() {
            clauses.push(format!("#f{i} = :v{i}"));
            update = update
                .expression_attribute_names(format!("#f{i}"), name)
                .expression_attribute_values(format!(":v{i}"), value_to_attribute(value)?);
        }

        update
            .update_expression(format!("SET {}", clauses.join(", ")))
            .send()
            .await
            .map_err(|e| AppError::Store {
                message: format!("Failed to update item in '{}': {}", table, e),
            })?;

        tracing::debug!(table, key, "Record fields merged");
        Ok(())
    }

    async fn scan(&self, collection: Collection, limit: usize) -> Result<Vec<Value>> {
        let table = self.table_name(collection);

        let output = self
            .client
            .scan()
            .table_name(table)
            .limit(limit as i32)
            .send()
            .await
            .map_err(|e| AppError::Store {
                message: format!("Failed to scan '{}': {}", table, e),
            })?;

        let items = output.items.unwrap_or_default();
        tracing::debug!(table, count = items.len(), "Scan page read");

        Ok(items.into_iter().map(attributes_to_item).collect())
    }

    async fn scan_newest(&self, collection: Collection, limit: usize) -> Result<Vec<Value>> {
        let table = self.table_name(collection);

        let output = self
            .client
            .query()
            .table_name(table)
            .index_name(&self.config.timestamp_index)
            .key_condition_expression("#kind = :kind")
            .expression_attribute_names("#kind", KIND_ATTR)
            .expression_attribute_values(
                ":kind",
                AttributeValue::S(collection.kind().to_string()),
            )
            .scan_index_forward(false)
            .limit(limit as i32)
            .send()
            .await
            .map_err(|e| AppError::Store {
                message: format!("Failed to query '{}' timestamp index: {}", table, e),
            })?;

        let items = output.items.unwrap_or_default();
        Ok(items.into_iter().map(attributes_to_item).collect())
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .describe_table()
            .table_name(&self.config.papers_table)
            .send()
            .await
            .map_err(|e| AppError::StoreConnection {
                message: format!("DynamoDB ping failed: {}", e),
            })?;
        Ok(())
    }
}

/// Convert a JSON object into a DynamoDB item map.
fn item_to_attributes(item: Value) -> Result<HashMap<String, AttributeValue>> {
    match item {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| Ok((k, value_to_attribute(v)?)))
            .collect(),
        other => Err(AppError::Store {
            message: format!("Record must be a JSON object, got {}", json_type_name(&other)),
        }),
    }
}

/// Convert a DynamoDB item map back into a JSON object, dropping the
/// internal `kind` attribute.
fn attributes_to_item(attrs: HashMap<String, AttributeValue>) -> Value {
    Value::Object(
        attrs
            .into_iter()
            .filter(|(k, _)| k != KIND_ATTR)
            .map(|(k, v)| (k, attribute_to_value(v)))
            .collect(),
    )
}

fn value_to_attribute(value: Value) -> Result<AttributeValue> {
    Ok(match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => AttributeValue::L(
            items
                .into_iter()
                .map(value_to_attribute)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Object(map) => AttributeValue::M(
            map.into_iter()
                .map(|(k, v)| Ok((k, value_to_attribute(v)?)))
                .collect::<Result<HashMap<_, _>>>()?,
        ),
    })
}

fn attribute_to_value(attr: AttributeValue) -> Value {
    match attr {
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::N(n) => {
            if let Ok(i) = n.parse::<i64>() {
                Value::from(i)
            } else if let Ok(f) = n.parse::<f64>() {
                Value::from(f)
            } else {
                Value::String(n)
            }
        }
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => {
            Value::Array(items.into_iter().map(attribute_to_value).collect())
        }
        AttributeValue::M(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, attribute_to_value(v)))
                .collect(),
        ),
        // Binary and set types are never written by this layer
        _ => Value::Null,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_conversion_roundtrip() {
        let item = json!({
            "url": "https://arxiv.org/abs/1706.03762",
            "title": "Attention Is All You Need",
            "timestamp": "2026-08-04T12:00:00Z",
            "results": [
                {"title": "A", "url": "https://arxiv.org/abs/1"},
                {"title": "B", "url": "https://arxiv.org/abs/2"},
            ],
            "result_count": 2,
            "score": 0.5,
            "archived": false,
        });

        let attrs = item_to_attributes(item.clone()).unwrap();
        let back = attributes_to_item(attrs);
        assert_eq!(back, item);
    }

    #[test]
    fn test_kind_attribute_is_stripped_on_read() {
        let mut attrs = HashMap::new();
        attrs.insert("url".to_string(), AttributeValue::S("u".to_string()));
        attrs.insert(KIND_ATTR.to_string(), AttributeValue::S("paper".to_string()));

        let item = attributes_to_item(attrs);
        assert_eq!(item, json!({"url": "u"}));
    }

    #[test]
    fn test_non_object_record_is_rejected() {
        let err = item_to_attributes(json!("bare string")).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn test_number_parsing_prefers_integers() {
        assert_eq!(attribute_to_value(AttributeValue::N("3".into())), json!(3));
        assert_eq!(
            attribute_to_value(AttributeValue::N("3.25".into())),
            json!(3.25)
        );
    }
}
