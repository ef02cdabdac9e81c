use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use tracing::{debug, warn};

use crate::store::{AttrValue, PARTITION_KEY_ATTR, SORT_KEY_ATTR};
use crate::{BlobError, BlobResult, ChunkStore, ItemKey, ScanPage, ScanRequest, StoredItem};

/// DynamoDB's own cap on one BatchWriteItem call
const MAX_BATCH_ITEMS: usize = 25;

const RESUBMIT_BASE_DELAY: Duration = Duration::from_millis(50);

type Item = HashMap<String, AttributeValue>;

/// [`ChunkStore`] backed by a DynamoDB table keyed on `userId` + `sk`
#[derive(Clone)]
pub struct DynamoChunkStore {
    client: Client,
    table: String,
    max_resubmits: u32,
}

impl DynamoChunkStore {
    pub fn new(sdk_config: &aws_config::SdkConfig, table: impl Into<String>) -> Self {
        Self::from_client(Client::new(sdk_config), table)
    }

    pub fn from_client(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
            max_resubmits: crate::config::DEFAULT_MAX_UNPROCESSED_RESUBMITS,
        }
    }

    /// How many times unprocessed batch items are sent again before giving up
    pub fn with_max_resubmits(mut self, attempts: u32) -> Self {
        self.max_resubmits = attempts;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn write_requests(&self, target: &str, mut pending: Vec<WriteRequest>) -> BlobResult<()> {
        let mut attempt = 0u32;
        loop {
            let output = self
                .client
                .batch_write_item()
                .request_items(self.table.clone(), pending)
                .send()
                .await
                .map_err(|e| BlobError::store_write(target, DisplayErrorContext(&e).to_string()))?;

            pending = output
                .unprocessed_items()
                .and_then(|unprocessed| unprocessed.get(&self.table))
                .cloned()
                .unwrap_or_default();
            if pending.is_empty() {
                return Ok(());
            }
            if attempt >= self.max_resubmits {
                return Err(BlobError::store_write(
                    target,
                    format!("{} items still unprocessed after {} resubmits", pending.len(), attempt),
                ));
            }

            attempt += 1;
            warn!(table = %self.table, unprocessed = pending.len(), attempt, "resubmitting unprocessed items");
            tokio::time::sleep(RESUBMIT_BASE_DELAY * 2u32.saturating_pow(attempt - 1)).await;
        }
    }
}

#[async_trait]
impl ChunkStore for DynamoChunkStore {
    async fn put_item(&self, item: StoredItem) -> BlobResult<()> {
        let target = item.sort_key().to_string();
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_attributes(item)))
            .send()
            .await
            .map_err(|e| BlobError::store_write(target, DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn put_batch(&self, items: Vec<StoredItem>) -> BlobResult<()> {
        for group in items.chunks(MAX_BATCH_ITEMS) {
            let target = batch_target(group);
            let requests = group
                .iter()
                .cloned()
                .map(|item| {
                    PutRequest::builder()
                        .set_item(Some(to_attributes(item)))
                        .build()
                        .map(|put| WriteRequest::builder().put_request(put).build())
                        .map_err(|e| BlobError::store_write(target.as_str(), e))
                })
                .collect::<BlobResult<Vec<_>>>()?;

            debug!(table = %self.table, count = requests.len(), "batch write");
            self.write_requests(&target, requests).await?;
        }
        Ok(())
    }

    async fn query_prefix(&self, partition_key: &str, sort_key_prefix: &str) -> BlobResult<Vec<StoredItem>> {
        let mut items = Vec::new();
        let mut last_evaluated_key: Option<Item> = None;

        loop {
            let response = self
                .client
                .query()
                .table_name(&self.table)
                .key_condition_expression("#pk = :pk AND begins_with(#sk, :prefix)")
                .expression_attribute_names("#pk", PARTITION_KEY_ATTR)
                .expression_attribute_names("#sk", SORT_KEY_ATTR)
                .expression_attribute_values(":pk", AttributeValue::S(partition_key.to_string()))
                .expression_attribute_values(":prefix", AttributeValue::S(sort_key_prefix.to_string()))
                .set_exclusive_start_key(last_evaluated_key.take())
                .send()
                .await
                .map_err(|e| BlobError::store_read(DisplayErrorContext(&e).to_string()))?;

            for raw in response.items() {
                items.push(from_attributes(raw)?);
            }

            match response.last_evaluated_key() {
                Some(key) if !key.is_empty() => last_evaluated_key = Some(key.clone()),
                _ => return Ok(items),
            }
        }
    }

    async fn scan(&self, request: ScanRequest) -> BlobResult<ScanPage> {
        let mut scan = self.client.scan().table_name(&self.table);

        if let Some(names) = &request.projection {
            scan = scan
                .expression_attribute_names("#pk", PARTITION_KEY_ATTR)
                .expression_attribute_names("#sk", SORT_KEY_ATTR);
            let mut expression = vec!["#pk".to_string(), "#sk".to_string()];
            for (n, name) in names.iter().enumerate() {
                let placeholder = format!("#a{n}");
                scan = scan.expression_attribute_names(placeholder.clone(), name.clone());
                expression.push(placeholder);
            }
            scan = scan.projection_expression(expression.join(", "));
        }
        if let Some(limit) = request.limit {
            if limit == 0 {
                return Err(BlobError::invalid("scan limit must be positive"));
            }
            scan = scan.limit(i32::try_from(limit).unwrap_or(i32::MAX));
        }
        if let Some(start) = request.start_after {
            scan = scan.set_exclusive_start_key(Some(key_attributes(start)));
        }

        let response = scan
            .send()
            .await
            .map_err(|e| BlobError::store_read(DisplayErrorContext(&e).to_string()))?;

        let items = response
            .items()
            .iter()
            .map(from_attributes)
            .collect::<BlobResult<Vec<_>>>()?;
        let next = match response.last_evaluated_key() {
            Some(key) if !key.is_empty() => Some(from_attributes(key)?.key),
            _ => None,
        };

        Ok(ScanPage { items, next })
    }
}

fn batch_target(group: &[StoredItem]) -> String {
    match (group.first(), group.last()) {
        (Some(first), Some(last)) if group.len() > 1 => format!("{}..{}", first.sort_key(), last.sort_key()),
        (Some(only), _) => only.sort_key().to_string(),
        _ => String::from("empty batch"),
    }
}

fn key_attributes(key: ItemKey) -> Item {
    HashMap::from([
        (PARTITION_KEY_ATTR.to_string(), AttributeValue::S(key.partition_key)),
        (SORT_KEY_ATTR.to_string(), AttributeValue::S(key.sort_key)),
    ])
}

fn to_attributes(item: StoredItem) -> Item {
    let mut out = key_attributes(item.key);
    for (name, value) in item.attributes {
        let value = match value {
            AttrValue::S(s) => AttributeValue::S(s),
            AttrValue::N(n) => AttributeValue::N(n.to_string()),
        };
        out.insert(name, value);
    }
    out
}

fn from_attributes(raw: &Item) -> BlobResult<StoredItem> {
    let key_part = |attr: &str| match raw.get(attr) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        _ => Err(BlobError::store_read(format!("item without string attribute {attr}"))),
    };
    let mut item = StoredItem::new(key_part(PARTITION_KEY_ATTR)?, key_part(SORT_KEY_ATTR)?);

    for (name, value) in raw {
        if name == PARTITION_KEY_ATTR || name == SORT_KEY_ATTR {
            continue;
        }
        let converted = match value {
            AttributeValue::S(s) => AttrValue::S(s.clone()),
            // Non-integer numbers are kept as text; typed readers reject them.
            AttributeValue::N(n) => n.parse().map(AttrValue::N).unwrap_or_else(|_| AttrValue::S(n.clone())),
            _ => continue,
        };
        item.attributes.insert(name.clone(), converted);
    }
    Ok(item)
}
