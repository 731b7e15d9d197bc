//! JSON-lines document sink

use async_trait::async_trait;
use semmed_core::{Document, DocumentSink, SinkError, SinkResult};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

type Output = Box<dyn AsyncWrite + Send + Unpin>;

/// Writes one JSON document per line to a file or stdout
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<Output>>,
    written: AtomicUsize,
}

impl JsonLinesSink {
    /// Create (or truncate) `path`, creating missing parent directories
    pub async fn create(path: &Path) -> SinkResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(path).await?;
        Ok(Self::from_writer(Box::new(file)))
    }

    pub fn stdout() -> Self {
        Self::from_writer(Box::new(tokio::io::stdout()))
    }

    pub fn from_writer(writer: Output) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            written: AtomicUsize::new(0),
        }
    }

    /// Documents written so far
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentSink for JsonLinesSink {
    async fn write(&self, document: &Document) -> SinkResult<()> {
        let mut line = serde_json::to_vec(document)?;
        line.push(b'\n');
        self.writer
            .lock()
            .await
            .write_all(&line)
            .await
            .map_err(|e| SinkError::write_failed(format!("document {}: {}", document.id, e)))?;
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn flush(&self) -> SinkResult<()> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "JsonLinesSink"
    }
}
