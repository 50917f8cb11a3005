//! Remote-list source draining a Redis list.

use async_trait::async_trait;
use tracing::debug;

use super::Source;
use crate::error::Result;
use crate::queue::RecordSender;
use crate::record::Record;

/// Default name of the remote list holding queued records.
pub const DEFAULT_LIST: &str = "items";

/// Drains a remote Redis list of JSON-encoded records.
///
/// The read and the trim run in one MULTI/EXEC pipeline, so the drain is
/// all-or-nothing from the perspective of concurrent producers: every entry
/// is either taken by this source or left for the next drain, never both.
pub struct RedisListSource {
    client: redis::Client,
    list: String,
}

impl RedisListSource {
    /// Create a source draining `list` on the server at `url`
    /// (e.g. `redis://localhost/8`).
    pub fn open(url: &str, list: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(url)?,
            list: list.into(),
        })
    }
}

#[async_trait]
impl Source for RedisListSource {
    async fn produce(&self, tx: RecordSender) -> Result<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (raw_items,): (Vec<String>,) = redis::pipe()
            .atomic()
            .lrange(&self.list, 0, -1)
            .ltrim(&self.list, 1, 0)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(list = %self.list, drained = raw_items.len(), "drained remote list");

        let mut produced = 0u64;
        for raw in &raw_items {
            let record: Record = serde_json::from_str(raw)?;
            tx.send(record).await?;
            produced += 1;
        }
        Ok(produced)
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
