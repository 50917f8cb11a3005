//! Bounded hand-off queue between a source and a sink.
//!
//! One queue exists per transfer cycle and is owned by the orchestrator.
//! Termination uses half-close rather than an in-band sentinel value: when
//! every [`RecordSender`] is dropped the queue stops accepting records, and
//! the consumer observes end-of-stream as "closed and drained". A real record
//! can therefore never collide with the terminator.
//!
//! The queue is bounded; a producer that outruns the sink suspends in
//! [`RecordSender::send`] until capacity frees up, which bounds memory by the
//! configured capacity plus whatever the sink has buffered.

use tokio::sync::mpsc;

use crate::error::{RelayError, Result};
use crate::record::Record;

/// Create a bounded hand-off queue with the given capacity.
///
/// Returns the producer and consumer halves. Capacity must be at least 1.
pub fn channel(capacity: usize) -> (RecordSender, RecordReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (RecordSender { tx }, RecordReceiver { rx, taken: 0 })
}

/// Producer half of the hand-off queue.
///
/// Held by exactly one source per cycle. Dropping it (or returning from
/// `produce`) half-closes the queue.
#[derive(Debug)]
pub struct RecordSender {
    tx: mpsc::Sender<Record>,
}

impl RecordSender {
    /// Enqueue one record, suspending while the queue is at capacity.
    ///
    /// Fails with [`RelayError::QueueClosed`] when the consumer half is gone,
    /// which tells a producer to stop early.
    pub async fn send(&self, record: Record) -> Result<()> {
        self.tx
            .send(record)
            .await
            .map_err(|_| RelayError::QueueClosed)
    }
}

/// Consumer half of the hand-off queue.
#[derive(Debug)]
pub struct RecordReceiver {
    rx: mpsc::Receiver<Record>,
    taken: u64,
}

impl RecordReceiver {
    /// Dequeue the next record in FIFO order.
    ///
    /// Suspends while the queue is empty and still open. Returns `None` only
    /// once the queue is closed *and* every queued record has been delivered.
    pub async fn recv(&mut self) -> Option<Record> {
        let record = self.rx.recv().await;
        if record.is_some() {
            self.taken += 1;
        }
        record
    }

    /// Force-close the queue from the consumer side.
    ///
    /// Already-queued records remain receivable; further sends fail.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Number of records currently sitting in the queue.
    ///
    /// Used for stranded-item accounting at shutdown.
    pub fn depth(&self) -> usize {
        self.rx.len()
    }

    /// Total number of records dequeued over the queue's lifetime.
    pub fn taken(&self) -> u64 {
        self.taken
    }
}
