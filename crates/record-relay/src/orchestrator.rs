//! Transfer orchestrator - drives source-to-sink cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{Config, RelayConfig};
use crate::connector::{build_sink, build_source, Sink, Source};
use crate::error::{RelayError, Result};
use crate::queue;

/// Transfer orchestrator.
///
/// Owns the hand-off queue lifecycle: each cycle gets a fresh bounded queue,
/// the source's produce runs as a concurrent task while the sink's consume is
/// driven on the current task, and cycles are strictly sequential. The
/// consume side finishing implies the queue was closed and drained, which
/// implies the producer finished enqueuing.
pub struct Relay {
    source: Arc<dyn Source>,
    sink: Arc<dyn Sink>,
    config: RelayConfig,
}

/// Result of a transfer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: "completed" or "interrupted".
    pub status: String,

    /// When the transfer started.
    pub started_at: DateTime<Utc>,

    /// When the transfer finished.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Number of completed cycles.
    pub cycles: u64,

    /// Records delivered to the sink's persist path.
    pub records_transferred: u64,

    /// Records stranded in the queue at shutdown.
    pub records_lost: u64,

    /// Average throughput (records/second).
    pub records_per_second: u64,
}

impl TransferReport {
    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome of one cycle.
struct CycleOutcome {
    delivered: u64,
    lost: u64,
    interrupted: bool,
}

/// Resolve once the cancellation signal fires.
///
/// A closed channel can no longer signal cancellation, so it parks forever
/// rather than reporting a spurious interrupt.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|v| *v).await.is_err() {
        std::future::pending::<()>().await;
    }
}

impl Relay {
    /// Create an orchestrator from already-built connectors.
    pub fn new(source: Arc<dyn Source>, sink: Arc<dyn Sink>, config: RelayConfig) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    /// Create an orchestrator from configuration, building both connectors.
    ///
    /// Target provisioning (index recreate) happens here, so provisioning
    /// failures surface before any cycle starts.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let source = build_source(&config.source)?;
        let sink = build_sink(&config.target).await?;
        Ok(Self::new(source, sink, config.relay.clone()))
    }

    /// Run one transfer (or a repeating series of cycles when configured).
    ///
    /// An interruption signal stops new cycles from starting; a cycle already
    /// in flight stops its producer, lets the sink drain and flush what is
    /// still queued, and exits. Interruption is a controlled shutdown, not an
    /// error. Records still queued after the final flush attempt are reported
    /// as lost with a warning.
    pub async fn transfer(
        &self,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<TransferReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut cancel = cancel.unwrap_or_else(never_cancelled);

        info!(run_id = %run_id, repeat = self.config.repeat, "starting transfer run");

        let mut cycles = 0u64;
        let mut transferred = 0u64;
        let mut lost = 0u64;
        let mut interrupted = false;

        loop {
            if *cancel.borrow() {
                interrupted = true;
                break;
            }

            let outcome = self.run_cycle(&mut cancel).await?;
            cycles += 1;
            transferred += outcome.delivered;
            lost += outcome.lost;

            if outcome.interrupted {
                interrupted = true;
                break;
            }
            if !self.config.repeat {
                break;
            }
        }

        if lost > 0 {
            warn!("{} items have been lost before closing the transfer", lost);
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let records_per_second = if duration > 0.0 {
            (transferred as f64 / duration) as u64
        } else {
            0
        };

        let status = if interrupted {
            "interrupted"
        } else {
            "completed"
        };
        info!(
            run_id = %run_id,
            status,
            cycles,
            records = transferred,
            "transfer run finished"
        );

        Ok(TransferReport {
            run_id,
            status: status.to_string(),
            started_at,
            completed_at,
            duration_seconds: duration,
            cycles,
            records_transferred: transferred,
            records_lost: lost,
            records_per_second,
        })
    }

    /// Run one produce/consume cycle against a fresh queue.
    async fn run_cycle(&self, cancel: &mut watch::Receiver<bool>) -> Result<CycleOutcome> {
        let (tx, mut rx) = queue::channel(self.config.queue_capacity);

        let source = Arc::clone(&self.source);
        let producer = tokio::spawn(async move { source.produce(tx).await });

        // Drive consume to completion. An interrupt stops the producer, which
        // half-closes the queue; the sink then drains what is already queued
        // and flushes on its own. The consume future is never dropped, so an
        // in-flight persist operation always completes or fails normally.
        let mut interrupted = false;
        let consume_result = {
            let consume = self.sink.consume(&mut rx);
            tokio::pin!(consume);
            loop {
                tokio::select! {
                    res = &mut consume => break res,
                    _ = cancelled(cancel), if !interrupted => {
                        info!("interrupt received, draining queue for a final flush");
                        interrupted = true;
                        producer.abort();
                    }
                }
            }
        };

        match consume_result {
            Ok(delivered) => {
                if !interrupted {
                    // Consume finishing means the producer dropped its queue
                    // handle; surface its error (e.g. malformed input) if any.
                    let produced = match producer.await {
                        Ok(Ok(n)) => n,
                        Ok(Err(e)) => return Err(e),
                        Err(e) => return Err(RelayError::Task(e.to_string())),
                    };
                    debug!(produced, delivered, "cycle complete");
                }
                Ok(CycleOutcome {
                    delivered,
                    lost: rx.depth() as u64,
                    interrupted,
                })
            }
            Err(e) if interrupted => {
                // Best-effort final flush failed. Everything dequeued before
                // the failure was handed to the persist path; whatever is
                // still queued is stranded.
                warn!(error = %e, "final flush failed during shutdown");
                rx.close();
                Ok(CycleOutcome {
                    delivered: rx.taken(),
                    lost: rx.depth() as u64,
                    interrupted: true,
                })
            }
            Err(e) => {
                // Persist failure: abort the producer and account for the
                // records it had already queued. No retry, no re-enqueue.
                producer.abort();
                rx.close();
                let stranded = rx.depth();
                if stranded > 0 {
                    warn!(
                        "{} items have been lost before closing the transfer",
                        stranded
                    );
                }
                Err(e)
            }
        }
    }
}

/// A cancellation receiver that never fires.
///
/// The sender is dropped immediately; [`cancelled`] treats the resulting
/// closed channel as "can never cancel".
fn never_cancelled() -> watch::Receiver<bool> {
    watch::channel(false).1
}
