use crate::core::queue::RowReceiver;
use crate::domain::model::{
    CellStyle, OutputRecord, Table, TransformedRow, TIMESTAMP_COLUMN, TIMESTAMP_COLUMN_WIDTH,
    TIMESTAMP_FORMAT,
};
use crate::domain::ports::{PersistFailurePolicy, TableStore};
use crate::utils::error::{PipelineError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The row was written at this index of the output table.
    Persisted { row_index: usize },
    /// Persisting failed and the row was given up.
    Dropped,
    /// Persisting failed and the row is held for the next cycle.
    Deferred,
    /// Every producer is gone and the queue is empty.
    Drained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinkStats {
    pub cycles: u64,
    pub rows_persisted: u64,
    pub rows_dropped: u64,
    pub persist_retries: u64,
    pub open_failures: u64,
}

/// The only consumer of the row queue. Each cycle reads the whole output
/// table, appends one record and writes the whole table back.
pub struct OutputSink<S: TableStore> {
    path: String,
    store: Arc<S>,
    receiver: RowReceiver,
    policy: PersistFailurePolicy,
    retry_delay: Duration,
    pending: Option<TransformedRow>,
    stats: SinkStats,
}

pub fn capture_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

impl<S: TableStore + 'static> OutputSink<S> {
    /// Takes the queue's receiver by value, so a queue can feed one sink only.
    pub fn new(path: impl Into<String>, store: Arc<S>, receiver: RowReceiver) -> Self {
        Self {
            path: path.into(),
            store,
            receiver,
            policy: PersistFailurePolicy::default(),
            retry_delay: DEFAULT_RETRY_DELAY,
            pending: None,
            stats: SinkStats::default(),
        }
    }

    pub fn with_policy(mut self, policy: PersistFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    async fn open_or_create(store: &S, path: &str) -> Result<Table> {
        // 狀態查詢失敗不能當成「不存在」，否則新表會覆蓋既有的輸出
        if !store.exists(path).await? {
            tracing::info!("📄 Output {} not found, starting a new table", path);
            return Ok(Table::with_output_header());
        }

        let mut table = store.load(path).await?;
        if table.is_empty() {
            tracing::warn!("Output {} has no rows, re-seeding the header", path);
            table = Table::with_output_header();
        }
        Ok(table)
    }

    fn append_record(table: &mut Table, row: &TransformedRow) -> usize {
        let record = OutputRecord::from_row(row, &capture_timestamp());
        let row_index = table.append_row(record.cells);
        if let Some(new_row) = table.row_mut(row_index) {
            new_row.style = Some(CellStyle::centered());
        }
        table.set_column_width(TIMESTAMP_COLUMN, TIMESTAMP_COLUMN_WIDTH);
        row_index
    }

    /// One open → dequeue → append → persist cycle.
    ///
    /// Fails with [`PipelineError::InterruptedWait`] if `cancel` fires while
    /// waiting for a row, or with the load error if the existing output
    /// table cannot be read. Persist failures are settled here according to
    /// the [`PersistFailurePolicy`].
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> Result<CycleOutcome> {
        self.stats.cycles += 1;

        let mut table = match Self::open_or_create(&self.store, &self.path).await {
            Ok(table) => table,
            Err(e) => {
                self.stats.open_failures += 1;
                return Err(e);
            }
        };

        let row = match self.pending.take() {
            Some(row) => {
                self.stats.persist_retries += 1;
                row
            }
            None => match self.receiver.dequeue_or_cancel(cancel).await? {
                Some(row) => row,
                None => return Ok(CycleOutcome::Drained),
            },
        };

        let row_index = Self::append_record(&mut table, &row);

        match self.store.save(&self.path, &table).await {
            Ok(()) => {
                self.stats.rows_persisted += 1;
                tracing::debug!(
                    "💾 Persisted row {} from {} (source row {})",
                    row_index,
                    row.source,
                    row.row.index
                );
                Ok(CycleOutcome::Persisted { row_index })
            }
            Err(e) => match self.policy {
                PersistFailurePolicy::DropRow => {
                    self.stats.rows_dropped += 1;
                    tracing::error!(
                        "❌ Dropping row from {} (source row {}): {}",
                        row.source,
                        row.row.index,
                        e
                    );
                    Ok(CycleOutcome::Dropped)
                }
                PersistFailurePolicy::Retry => {
                    tracing::error!(
                        "❌ Persist failed, holding row from {} for retry: {}",
                        row.source,
                        e
                    );
                    self.pending = Some(row);
                    Ok(CycleOutcome::Deferred)
                }
            },
        }
    }

    /// Cycles until `cancel` fires or the queue is drained and closed.
    pub async fn run(mut self, cancel: CancellationToken) -> SinkStats {
        tracing::info!("🚀 Output sink started for {}", self.path);

        loop {
            let pause = match self.run_cycle(&cancel).await {
                Ok(CycleOutcome::Persisted { .. }) | Ok(CycleOutcome::Dropped) => false,
                Ok(CycleOutcome::Deferred) => true,
                Ok(CycleOutcome::Drained) => {
                    tracing::info!("Queue drained and closed");
                    break;
                }
                Err(PipelineError::InterruptedWait) => {
                    tracing::debug!("Sink wait interrupted by shutdown");
                    break;
                }
                Err(e) => {
                    tracing::error!("❌ Failed to open output {}: {}", self.path, e);
                    true
                }
            };

            // 避免輸出檔壞掉時空轉
            if pause {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.retry_delay) => {}
                }
            }
        }

        if let Some(row) = self.pending.take() {
            self.stats.rows_dropped += 1;
            tracing::warn!("Unpersisted row from {} lost at shutdown", row.source);
        }

        // 被取消時佇列裡可能還有列，計入 dropped 讓報表對得上
        let mut abandoned = 0u64;
        while self.receiver.try_dequeue().is_some() {
            abandoned += 1;
        }
        if abandoned > 0 {
            self.stats.rows_dropped += abandoned;
            tracing::warn!("{} queued rows lost at shutdown", abandoned);
        }

        tracing::info!(
            "🏁 Output sink stopped: {} persisted, {} dropped",
            self.stats.rows_persisted,
            self.stats.rows_dropped
        );
        self.stats
    }
}
