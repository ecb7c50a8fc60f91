//! Concrete result sinks

use crate::output::traits::{PublishResult, ResultSink};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one message per line to a file
///
/// Each line is a JSON array of Records, so the file can be replayed by
/// `expand` or any other consumer of the result queue.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    // Serializes appends from concurrent publishers
    lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    async fn send(&self, payload: &str) -> PublishResult<()> {
        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(payload.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

/// Prints each message on its own line
#[derive(Debug, Default)]
pub struct StdoutSink;

#[async_trait]
impl ResultSink for StdoutSink {
    async fn send(&self, payload: &str) -> PublishResult<()> {
        println!("{}", payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_json_lines_sink_appends() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path().join("results.jsonl"));

        sink.send("[1]").await.unwrap();
        sink.send("[2]").await.unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content, "[1]\n[2]\n");
    }

    #[tokio::test]
    async fn test_json_lines_sink_reports_io_errors() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path().join("missing").join("results.jsonl"));
        assert!(sink.send("[]").await.is_err());
    }
}
