//! File-backed connectors using brace-delimited JSON framing.
//!
//! A file holds a sequence of pretty-printed JSON documents. A line consisting
//! solely of a closing brace terminates one document; each accumulated frame
//! parses independently. [`write_framed`] emits the same framing, so records
//! written by the sink read back identically through the source.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, warn};

use super::{Sink, Source};
use crate::error::Result;
use crate::queue::{RecordReceiver, RecordSender};
use crate::record::Record;

/// Render records in the brace-delimited framing understood by [`FileSource`].
///
/// Each record is pretty-printed, so its final line is exactly `}`. An empty
/// record would pretty-print as `{}` on a single line, which the framing
/// reader cannot terminate, so it is spelled out as an open and close brace
/// on separate lines.
pub fn write_framed(records: &[Record]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        if record.is_empty() {
            out.push_str("{\n}\n");
        } else {
            out.push_str(&serde_json::to_string_pretty(record)?);
            out.push('\n');
        }
    }
    Ok(out)
}

/// Reads brace-framed JSON documents from a text file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source reading from the given path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Source for FileSource {
    async fn produce(&self, tx: RecordSender) -> Result<u64> {
        let file = File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();

        let mut frame = String::new();
        let mut produced = 0u64;

        while let Some(line) = lines.next_line().await? {
            frame.push_str(&line);
            frame.push('\n');

            if line == "}" {
                let record: Record = serde_json::from_str(&frame)?;
                tx.send(record).await?;
                frame.clear();
                produced += 1;
            }
        }

        if !frame.trim().is_empty() {
            warn!(path = %self.path.display(), "discarding unterminated trailing frame");
        }

        debug!(path = %self.path.display(), produced, "file source exhausted");
        Ok(produced)
    }

    async fn health_check(&self) -> Result<()> {
        File::open(&self.path).await?;
        Ok(())
    }
}

/// Appends records to a text file in brace-delimited framing.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a sink appending to the given path, creating it if missing.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn consume(&self, rx: &mut RecordReceiver) -> Result<u64> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;
        let mut writer = BufWriter::new(file);

        let mut persisted = 0u64;
        while let Some(record) = rx.recv().await {
            let framed = write_framed(std::slice::from_ref(&record))?;
            writer.write_all(framed.as_bytes()).await?;
            persisted += 1;
        }
        writer.flush().await?;

        debug!(path = %self.path.display(), persisted, "file sink drained");
        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record(id: &str) -> Record {
        let mut r = Record::new();
        r.insert("uuid", json!(id));
        r.insert("origin", json!("https://example.org/repo.git"));
        r.insert("data", json!({"message": "fix build", "files": ["a.rs", "b.rs"]}));
        r
    }

    async fn drain(mut rx: queue::RecordReceiver) -> Vec<Record> {
        let mut out = Vec::new();
        while let Some(r) = rx.recv().await {
            out.push(r);
        }
        out
    }

    #[tokio::test]
    async fn test_produce_frames_multiple_documents() {
        let records = vec![record("u1"), record("u2"), record("u3")];
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(write_framed(&records).unwrap().as_bytes())
            .unwrap();

        let source = FileSource::new(file.path());
        let (tx, rx) = queue::channel(16);
        let produced = source.produce(tx).await.unwrap();
        assert_eq!(produced, 3);

        let got = drain(rx).await;
        assert_eq!(got, records);
    }

    #[tokio::test]
    async fn test_produce_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let source = FileSource::new(file.path());
        let (tx, rx) = queue::channel(16);
        assert_eq!(source.produce(tx).await.unwrap(), 0);
        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_produce_malformed_frame_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\n  \"uuid\": \"u1\",\n}}").unwrap(); // trailing comma

        let source = FileSource::new(file.path());
        let (tx, _rx) = queue::channel(16);
        let err = source.produce(tx).await.unwrap_err();
        assert!(matches!(err, crate::error::RelayError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_round_trip_through_sink_and_source() {
        let records = vec![record("u1"), record("u2")];
        let file = NamedTempFile::new().unwrap();

        let sink = FileSink::new(file.path());
        let (tx, mut rx) = queue::channel(16);
        for r in &records {
            tx.send(r.clone()).await.unwrap();
        }
        drop(tx);
        assert_eq!(sink.consume(&mut rx).await.unwrap(), 2);

        let source = FileSource::new(file.path());
        let (tx, rx) = queue::channel(16);
        source.produce(tx).await.unwrap();
        assert_eq!(drain(rx).await, records);
    }

    #[tokio::test]
    async fn test_empty_record_round_trips() {
        // An empty record must not collapse to a one-line `{}`, which would
        // merge into the following document.
        let records = vec![Record::new(), record("u1")];
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(write_framed(&records).unwrap().as_bytes())
            .unwrap();

        let source = FileSource::new(file.path());
        let (tx, rx) = queue::channel(16);
        assert_eq!(source.produce(tx).await.unwrap(), 2);
        assert_eq!(drain(rx).await, records);
    }

    #[tokio::test]
    async fn test_missing_file_fails_health_check() {
        let source = FileSource::new("/nonexistent/items.json");
        assert!(source.health_check().await.is_err());
    }
}
