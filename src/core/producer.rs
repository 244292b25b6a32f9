use crate::core::queue::RowSender;
use crate::core::transform::RowTransformer;
use crate::domain::model::TransformedRow;
use crate::domain::ports::TableStore;
use crate::utils::error::{PipelineError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Rows emitted by one pass over a source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub rows_enqueued: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProducerStats {
    pub passes: u64,
    pub failed_passes: u64,
    pub rows_enqueued: u64,
}

/// Polls one source table and feeds its transformed data rows into the queue.
pub struct ProducerWorker<S: TableStore> {
    path: String,
    store: Arc<S>,
    transformer: RowTransformer,
    sender: RowSender,
    interval: Duration,
}

impl<S: TableStore + 'static> ProducerWorker<S> {
    pub fn new(path: impl Into<String>, store: Arc<S>, sender: RowSender) -> Self {
        Self {
            path: path.into(),
            store,
            transformer: RowTransformer::new(),
            sender,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Load, transform and enqueue every data row once. The header row is
    /// never transformed.
    pub async fn run_pass(&self) -> Result<PassReport> {
        let table = self.store.load(&self.path).await?;

        let mut report = PassReport::default();
        for row in table.rows.into_iter().filter(|row| !row.is_header()) {
            let transformed = self.transformer.transform(row);
            self.sender
                .enqueue(TransformedRow::new(self.path.clone(), transformed))?;
            report.rows_enqueued += 1;
        }
        Ok(report)
    }

    /// Passes forever, `interval` apart, until `cancel` fires or the queue
    /// closes. A failed pass is logged and retried on the next one.
    pub async fn run(self, cancel: CancellationToken) -> ProducerStats {
        let mut stats = ProducerStats::default();
        tracing::info!("🚀 Producer started for {}", self.path);

        loop {
            if cancel.is_cancelled() {
                break;
            }

            stats.passes += 1;
            match self.run_pass().await {
                Ok(report) => {
                    stats.rows_enqueued += report.rows_enqueued as u64;
                    tracing::debug!(
                        "📥 {}: enqueued {} rows (pass {})",
                        self.path,
                        report.rows_enqueued,
                        stats.passes
                    );
                }
                Err(PipelineError::QueueClosed) => {
                    tracing::info!("Queue closed, producer for {} stopping", self.path);
                    break;
                }
                Err(e) if e.is_transient() => {
                    stats.failed_passes += 1;
                    tracing::warn!("⚠️ Pass over {} failed: {}", self.path, e);
                }
                Err(e) => {
                    stats.failed_passes += 1;
                    tracing::error!("❌ Pass over {} failed: {}", self.path, e);
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(
            "🏁 Producer for {} stopped after {} passes ({} failed, {} rows)",
            self.path,
            stats.passes,
            stats.failed_passes,
            stats.rows_enqueued
        );
        stats
    }
}
