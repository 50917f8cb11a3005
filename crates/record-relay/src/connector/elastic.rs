//! Bulk-indexing sink for an Elasticsearch-compatible target.
//!
//! Speaks the plain HTTP API: batches go out as one NDJSON `POST /_bulk`
//! keyed by each record's identifier field, followed by a refresh so the
//! index is immediately query-visible. Any per-item error in the bulk
//! response fails the consume loop with the first reported detail.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::Sink;
use crate::error::{RelayError, Result};
use crate::queue::RecordReceiver;
use crate::record::Record;

/// Default number of records per bulk request.
pub const DEFAULT_BULK_SIZE: usize = 100;

const NDJSON: &str = "application/x-ndjson";

/// Sink writing batches of records to an Elasticsearch index.
#[derive(Debug)]
pub struct ElasticSink {
    client: reqwest::Client,
    base_url: String,
    index: String,
    bulk_size: usize,
}

impl ElasticSink {
    /// Connect to the target and optionally recreate the destination index.
    ///
    /// Fails with a provisioning error when `index` is empty, or when a
    /// requested delete/create is not acknowledged by the target. Recreation
    /// happens here, before any transfer starts.
    pub async fn connect(
        host: &str,
        port: u16,
        index: String,
        bulk_size: usize,
        recreate: bool,
    ) -> Result<Self> {
        if index.is_empty() {
            return Err(RelayError::provisioning(
                "bulk sink requires a destination index name",
            ));
        }

        let sink = Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{host}:{port}"),
            index,
            bulk_size: bulk_size.max(1),
        };

        if recreate {
            sink.recreate_index().await?;
        }

        Ok(sink)
    }

    /// Delete the index if it exists and recreate it with the fixed mapping.
    async fn recreate_index(&self) -> Result<()> {
        let index_url = format!("{}/{}", self.base_url, self.index);

        let exists = self.client.head(&index_url).send().await?.status() == StatusCode::OK;
        if exists {
            let resp: Value = self.client.delete(&index_url).send().await?.json().await?;
            if resp["acknowledged"] != json!(true) {
                return Err(RelayError::provisioning(format!(
                    "index '{}' not deleted",
                    self.index
                )));
            }
        }

        let resp: Value = self
            .client
            .put(&index_url)
            .json(&index_mapping())
            .send()
            .await?
            .json()
            .await?;
        if resp["acknowledged"] != json!(true) {
            return Err(RelayError::provisioning(format!(
                "index '{}' not created",
                self.index
            )));
        }

        info!(index = %self.index, "recreated target index");
        Ok(())
    }

    /// Submit one batch as a bulk request and force a refresh.
    async fn flush(&self, batch: &[Record]) -> Result<()> {
        let body = build_bulk_body(&self.index, batch)?;

        let resp: Value = self
            .client
            .post(format!("{}/_bulk", self.base_url))
            .header(CONTENT_TYPE, NDJSON)
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // Make the batch query-visible before inspecting per-item errors,
        // matching the write-then-refresh order of the bulk protocol.
        self.client
            .post(format!("{}/{}/_refresh", self.base_url, self.index))
            .send()
            .await?
            .error_for_status()?;

        if let Some(detail) = first_bulk_error(&resp) {
            return Err(RelayError::persist(detail));
        }

        debug!(index = %self.index, records = batch.len(), "flushed bulk batch");
        Ok(())
    }
}

#[async_trait]
impl Sink for ElasticSink {
    async fn consume(&self, rx: &mut RecordReceiver) -> Result<u64> {
        let mut batch = Vec::with_capacity(self.bulk_size);
        let mut persisted = 0u64;

        while let Some(record) = rx.recv().await {
            batch.push(record);
            if batch.len() == self.bulk_size {
                self.flush(&batch).await?;
                persisted += batch.len() as u64;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.flush(&batch).await?;
            persisted += batch.len() as u64;
        }

        Ok(persisted)
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .get(&self.base_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Fixed mapping for a recreated index: two indexed keyword attributes, all
/// other fields stored but not dynamically mapped.
fn index_mapping() -> Value {
    json!({
        "mappings": {
            "dynamic": false,
            "properties": {
                "origin": { "type": "keyword" },
                "tag": { "type": "keyword" }
            }
        }
    })
}

/// Render a batch as an NDJSON bulk body, one index action per record keyed
/// by its identifier field.
fn build_bulk_body(index: &str, batch: &[Record]) -> Result<String> {
    let mut body = String::new();
    for record in batch {
        let id = record.id().ok_or(RelayError::MissingId)?;
        let action = json!({ "index": { "_index": index, "_id": id } });
        body.push_str(&action.to_string());
        body.push('\n');
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    Ok(body)
}

/// Extract the first per-item error detail from a bulk response, if any.
fn first_bulk_error(resp: &Value) -> Option<String> {
    if resp["errors"] != json!(true) {
        return None;
    }
    resp["items"]
        .as_array()?
        .iter()
        .filter_map(|item| item.as_object())
        .filter_map(|actions| actions.values().next())
        .find_map(|result| result.get("error").map(Value::to_string))
}
