//! Connector capability traits and concrete adapters.
//!
//! This module defines the two narrow capability interfaces of the pipeline:
//!
//! - [`Source`]: produces records from an upstream storage into the hand-off queue
//! - [`Sink`]: consumes records from the hand-off queue into a downstream storage
//!
//! A concrete adapter implements whichever side it supports; nothing forces a
//! read-only endpoint to stub out write behavior or vice versa. Adapters:
//!
//! - [`file::FileSource`] / [`file::FileSink`]: brace-framed JSON documents in a text file
//! - [`memory::SequenceSource`] / [`memory::MemorySink`]: pre-materialized records in memory
//! - [`redis::RedisListSource`]: atomic drain of a remote Redis list
//! - [`elastic::ElasticSink`]: batched bulk indexing over HTTP

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{SourceConfig, TargetConfig};
use crate::error::Result;
use crate::queue::{RecordReceiver, RecordSender};

pub mod elastic;
pub mod file;
pub mod memory;
pub mod redis;

pub use elastic::ElasticSink;
pub use file::{FileSink, FileSource};
pub use memory::{MemorySink, SequenceSource};
pub use self::redis::RedisListSource;

/// Produce records from an upstream storage into the hand-off queue.
#[async_trait]
pub trait Source: Send + Sync {
    /// Read a self-determined, possibly unbounded stream of records from the
    /// underlying storage and enqueue each one in the order the storage
    /// yields them. Returns the number of records produced.
    ///
    /// Returning (and thereby dropping `tx`) half-closes the queue; an empty
    /// source simply returns 0. A document that does not parse is a fatal
    /// error terminating the produce operation.
    async fn produce(&self, tx: RecordSender) -> Result<u64>;

    /// Check that the underlying storage is reachable.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Consume records from the hand-off queue into a downstream storage.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Dequeue records until the queue is closed and drained, persisting them
    /// to the underlying storage. Returns the number of records persisted.
    ///
    /// Bulk-oriented sinks buffer records into a batch and flush it when full
    /// and once more at end-of-stream (skipping the persist call entirely if
    /// the final batch is empty). Dequeuing is decoupled from durability: a
    /// failed persist aborts the consume loop with an error and never
    /// re-enqueues the batch.
    async fn consume(&self, rx: &mut RecordReceiver) -> Result<u64>;

    /// Check that the underlying storage is reachable.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Build a source connector from configuration.
pub fn build_source(config: &SourceConfig) -> Result<Arc<dyn Source>> {
    match config {
        SourceConfig::File { path } => Ok(Arc::new(FileSource::new(path))),
        SourceConfig::Redis { url, list } => {
            Ok(Arc::new(RedisListSource::open(url, list.clone())?))
        }
    }
}

/// Build a sink connector from configuration.
///
/// For bulk targets this performs any requested one-time provisioning
/// (index recreate) before returning, so provisioning failures surface
/// before a transfer starts.
pub async fn build_sink(config: &TargetConfig) -> Result<Arc<dyn Sink>> {
    match config {
        TargetConfig::Elasticsearch {
            host,
            port,
            index,
            recreate,
            bulk_size,
        } => {
            let sink = ElasticSink::connect(host, *port, index.clone(), *bulk_size, *recreate)
                .await?;
            Ok(Arc::new(sink))
        }
        TargetConfig::File { path } => Ok(Arc::new(FileSink::new(path))),
    }
}
