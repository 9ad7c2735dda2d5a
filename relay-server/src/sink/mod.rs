//! Optional side channel recording received messages.
//!
//! The webhook handler hands every received message to a [`MessageSink`]
//! from a detached task. The default sink discards records;
//! [`JsonlFileSink`] appends one JSON object per line to a file that is
//! never rewritten.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("message log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("message record could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One received message as written to the log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageRecord {
    pub from: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
    /// Full notification body as received
    pub raw: Value,
    /// Unix epoch seconds
    pub received_at: u64,
}

impl MessageRecord {
    pub fn new(from: &str, kind: &str, text: Option<&str>, raw: Value) -> Self {
        let received_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self {
            from: from.to_string(),
            kind: kind.to_string(),
            text: text.map(str::to_string),
            raw,
            received_at,
        }
    }
}

/// Destination for received-message records.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn record(&self, record: &MessageRecord) -> Result<(), SinkError>;
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl MessageSink for NoopSink {
    async fn record(&self, _record: &MessageRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Append-only JSON Lines file.
pub struct JsonlFileSink {
    file: Mutex<File>,
}

impl JsonlFileSink {
    /// Open (or create) the log file in append mode.
    ///
    /// Called once at startup, so the open itself is synchronous; all writes
    /// go through `tokio::fs`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        info!(path = %path.display(), "message_log_opened");

        Ok(Self {
            file: Mutex::new(File::from_std(file)),
        })
    }
}

#[async_trait]
impl MessageSink for JsonlFileSink {
    async fn record(&self, record: &MessageRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Build the sink selected by configuration.
pub fn from_path(path: Option<&Path>) -> Result<Arc<dyn MessageSink>, SinkError> {
    match path {
        Some(path) => Ok(Arc::new(JsonlFileSink::open(path)?)),
        None => Ok(Arc::new(NoopSink)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_log(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "relay-{}-{}-{}.jsonl",
            name,
            std::process::id(),
            nanos
        ))
    }

    #[tokio::test]
    async fn test_noop_sink_accepts_records() {
        let record = MessageRecord::new("1555", "text", Some("hi"), serde_json::json!({}));
        assert!(NoopSink.record(&record).await.is_ok());
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends_lines() {
        let path = temp_log("append");
        let sink = JsonlFileSink::open(&path).unwrap();

        let first = MessageRecord::new("111", "text", Some("one"), serde_json::json!({"n": 1}));
        let second = MessageRecord::new("222", "text", Some("two"), serde_json::json!({"n": 2}));
        sink.record(&first).await.unwrap();
        sink.record(&second).await.unwrap();

        // Reopening must not truncate.
        let reopened = JsonlFileSink::open(&path).unwrap();
        let third = MessageRecord::new("333", "text", None, serde_json::json!({"n": 3}));
        reopened.record(&third).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let parsed: MessageRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, second);

        let last: Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["type"], "text");
        assert!(last["text"].is_null());

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_from_path_none_is_noop() {
        let sink = from_path(None).unwrap();
        let record = MessageRecord::new("1555", "text", Some("hi"), Value::Null);
        assert!(sink.record(&record).await.is_ok());
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let path = std::env::temp_dir()
            .join("relay-no-such-dir-for-tests")
            .join("log.jsonl");
        assert!(matches!(JsonlFileSink::open(&path), Err(SinkError::Io(_))));
    }
}
