//! In-memory connectors for synthetic or already-fetched data.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{Sink, Source};
use crate::error::Result;
use crate::queue::{RecordReceiver, RecordSender};
use crate::record::Record;

/// Replays a pre-materialized sequence of records.
pub struct SequenceSource {
    records: Vec<Record>,
}

impl SequenceSource {
    /// Create a source replaying the given records in order.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl Source for SequenceSource {
    async fn produce(&self, tx: RecordSender) -> Result<u64> {
        for record in &self.records {
            tx.send(record.clone()).await?;
        }
        Ok(self.records.len() as u64)
    }
}

#[derive(Default)]
struct MemoryStore {
    records: Vec<Record>,
    flush_sizes: Vec<usize>,
}

/// Batching sink that persists into shared memory.
///
/// Buffers records into batches of `bulk_size` exactly like a bulk-indexed
/// target would, recording the size of every flush. Cloning the sink shares
/// the underlying store, so a test (or dry run) can hand one clone to the
/// orchestrator and inspect the other afterwards.
#[derive(Clone)]
pub struct MemorySink {
    store: Arc<Mutex<MemoryStore>>,
    bulk_size: usize,
}

impl MemorySink {
    /// Create a sink flushing every `bulk_size` records.
    pub fn new(bulk_size: usize) -> Self {
        Self {
            store: Arc::new(Mutex::new(MemoryStore::default())),
            bulk_size: bulk_size.max(1),
        }
    }

    /// All records persisted so far, in arrival order.
    pub fn records(&self) -> Vec<Record> {
        self.store.lock().unwrap().records.clone()
    }

    /// The size of every flush performed, in order.
    pub fn flush_sizes(&self) -> Vec<usize> {
        self.store.lock().unwrap().flush_sizes.clone()
    }

    fn flush(&self, batch: &mut Vec<Record>) {
        let mut store = self.store.lock().unwrap();
        store.flush_sizes.push(batch.len());
        store.records.append(batch);
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn consume(&self, rx: &mut RecordReceiver) -> Result<u64> {
        let mut batch = Vec::with_capacity(self.bulk_size);
        let mut persisted = 0u64;

        while let Some(record) = rx.recv().await {
            batch.push(record);
            if batch.len() == self.bulk_size {
                persisted += batch.len() as u64;
                self.flush(&mut batch);
            }
        }

        if !batch.is_empty() {
            persisted += batch.len() as u64;
            self.flush(&mut batch);
        }

        debug!(persisted, "memory sink drained");
        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use serde_json::json;

    fn records(n: u64) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let mut r = Record::new();
                r.insert("uuid", json!(format!("id-{i}")));
                r.insert("seq", json!(i));
                r
            })
            .collect()
    }

    #[tokio::test]
    async fn test_sequence_source_replays_in_order() {
        let source = SequenceSource::new(records(5));
        let (tx, mut rx) = queue::channel(16);
        assert_eq!(source.produce(tx).await.unwrap(), 5);

        for i in 0..5 {
            let got = rx.recv().await.unwrap();
            assert_eq!(got.get("seq"), Some(&json!(i)));
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_sink_flushes_full_and_partial_batches() {
        // 250 records at bulk size 100 must flush as 100, 100, 50.
        let source = SequenceSource::new(records(250));
        let sink = MemorySink::new(100);

        let (tx, mut rx) = queue::channel(512);
        source.produce(tx).await.unwrap();
        assert_eq!(sink.consume(&mut rx).await.unwrap(), 250);
        assert_eq!(sink.flush_sizes(), vec![100, 100, 50]);
        assert_eq!(sink.records().len(), 250);
    }

    #[tokio::test]
    async fn test_sink_exact_multiple_has_no_empty_flush() {
        let source = SequenceSource::new(records(200));
        let sink = MemorySink::new(100);

        let (tx, mut rx) = queue::channel(512);
        source.produce(tx).await.unwrap();
        sink.consume(&mut rx).await.unwrap();
        assert_eq!(sink.flush_sizes(), vec![100, 100]);
    }

    #[tokio::test]
    async fn test_empty_source_no_flush_no_hang() {
        let source = SequenceSource::new(Vec::new());
        let sink = MemorySink::new(100);

        let (tx, mut rx) = queue::channel(16);
        assert_eq!(source.produce(tx).await.unwrap(), 0);
        assert_eq!(sink.consume(&mut rx).await.unwrap(), 0);
        assert!(sink.flush_sizes().is_empty());
    }
}
