//! # record-relay
//!
//! Queue-based record transfer pipeline with pluggable source/sink connectors.
//!
//! Records flow from a [`Source`] through a bounded in-memory hand-off queue
//! into a [`Sink`], driven by the [`Relay`] orchestrator:
//!
//! - **Pluggable endpoints**: file, remote Redis list, in-memory sequence,
//!   and bulk Elasticsearch adapters; any storage can implement either side
//! - **Bounded hand-off** with backpressure and half-close termination
//! - **Bulk batching** for write-heavy targets with partial final flushes
//! - **Graceful interruption** with a final drain and lost-item accounting
//!
//! ## Example
//!
//! ```rust,no_run
//! use record_relay::{Config, Relay};
//!
//! #[tokio::main]
//! async fn main() -> record_relay::Result<()> {
//!     let config = Config::load("relay.yaml")?;
//!     let relay = Relay::from_config(&config).await?;
//!     let report = relay.transfer(None).await?;
//!     println!("Transferred {} records", report.records_transferred);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod record;

// Re-exports for convenient access
pub use config::{Config, RelayConfig, SourceConfig, TargetConfig};
pub use connector::{Sink, Source};
pub use error::{RelayError, Result};
pub use orchestrator::{Relay, TransferReport};
pub use record::{Record, ID_FIELD};
