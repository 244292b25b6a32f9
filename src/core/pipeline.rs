use crate::core::producer::{ProducerStats, ProducerWorker, DEFAULT_POLL_INTERVAL};
use crate::core::queue::RowQueue;
use crate::core::sink::{OutputSink, SinkStats, DEFAULT_RETRY_DELAY};
use crate::domain::ports::{ConfigProvider, PersistFailurePolicy, TableStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// N source producers funnelled into one output sink.
///
/// [`Pipeline::spawn`] is the only place a queue is created and its single
/// receiver handed to an [`OutputSink`].
pub struct Pipeline<S: TableStore> {
    store: Arc<S>,
    sources: Vec<String>,
    output: String,
    poll_interval: Duration,
    retry_delay: Duration,
    drain_timeout: Duration,
    policy: PersistFailurePolicy,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub producers: Vec<(String, ProducerStats)>,
    pub sink: SinkStats,
}

impl PipelineReport {
    pub fn rows_enqueued(&self) -> u64 {
        self.producers
            .iter()
            .map(|(_, stats)| stats.rows_enqueued)
            .sum()
    }
}

pub struct PipelineHandle {
    cancel: CancellationToken,
    producers_cancel: CancellationToken,
    drain_timeout: Duration,
    producers: Vec<(String, JoinHandle<ProducerStats>)>,
    sink: JoinHandle<SinkStats>,
}

impl<S: TableStore + 'static> Pipeline<S> {
    pub fn new(store: Arc<S>, output: impl Into<String>) -> Self {
        Self {
            store,
            sources: Vec::new(),
            output: output.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_delay: DEFAULT_RETRY_DELAY,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            policy: PersistFailurePolicy::default(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C, store: Arc<S>) -> Self {
        let poll_interval = config.poll_interval();
        Self::new(store, config.output_path())
            .with_sources(config.source_paths().iter().cloned())
            .with_poll_interval(poll_interval)
            .with_retry_delay(poll_interval)
            .with_policy(config.persist_failure_policy())
    }

    pub fn with_source(mut self, path: impl Into<String>) -> Self {
        self.sources.push(path.into());
        self
    }

    pub fn with_sources(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.sources.extend(paths);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_policy(mut self, policy: PersistFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// How long [`PipelineHandle::shutdown`] lets the sink drain the queue.
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn spawn(self) -> PipelineHandle {
        let cancel = CancellationToken::new();
        let producers_cancel = cancel.child_token();
        let (sender, receiver) = RowQueue::channel();

        tracing::info!(
            "Starting pipeline: {} sources -> {} (poll every {:?}, on persist failure: {:?})",
            self.sources.len(),
            self.output,
            self.poll_interval,
            self.policy
        );

        let producers = self
            .sources
            .into_iter()
            .map(|path| {
                let worker =
                    ProducerWorker::new(path.clone(), Arc::clone(&self.store), sender.clone())
                        .with_interval(self.poll_interval);
                (path, tokio::spawn(worker.run(producers_cancel.clone())))
            })
            .collect();
        // 只留 producer 手上的 sender，全部結束後 sink 才能看到佇列關閉
        drop(sender);

        let sink = OutputSink::new(self.output, self.store, receiver)
            .with_policy(self.policy)
            .with_retry_delay(self.retry_delay);
        let sink = tokio::spawn(sink.run(cancel.child_token()));

        PipelineHandle {
            cancel,
            producers_cancel,
            drain_timeout: self.drain_timeout,
            producers,
            sink,
        }
    }
}

impl PipelineHandle {
    /// Cancelling this token stops every task at once, leaving queued rows
    /// unwritten. [`shutdown`](Self::shutdown) drains first.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the producers, lets the sink write what is already queued, then
    /// waits for everything to finish. The sink is cancelled if draining
    /// takes longer than the drain timeout.
    pub async fn shutdown(self) -> PipelineReport {
        self.producers_cancel.cancel();
        let mut report = PipelineReport::default();

        for (path, handle) in self.producers {
            match handle.await {
                Ok(stats) => report.producers.push((path, stats)),
                Err(e) => tracing::error!("Producer task for {} panicked: {}", path, e),
            }
        }

        // producer 全部結束後 sender 都已釋放，sink 清空佇列就會自行停止
        let mut sink = self.sink;
        let joined = match tokio::time::timeout(self.drain_timeout, &mut sink).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(
                    "Sink did not drain within {:?}, cancelling",
                    self.drain_timeout
                );
                self.cancel.cancel();
                sink.await
            }
        };
        match joined {
            Ok(stats) => report.sink = stats,
            Err(e) => tracing::error!("Sink task panicked: {}", e),
        }

        tracing::info!(
            "Pipeline stopped: {} rows enqueued, {} persisted, {} dropped",
            report.rows_enqueued(),
            report.sink.rows_persisted,
            report.sink.rows_dropped
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::CsvTableStore;
    use crate::domain::model::Table;
    use crate::utils::error::{PipelineError, Result};
    use tempfile::TempDir;

    /// Reads real CSV sources but can never write the output.
    struct ReadOnlyStore {
        inner: CsvTableStore,
    }

    impl TableStore for ReadOnlyStore {
        async fn load(&self, path: &str) -> Result<Table> {
            self.inner.load(path).await
        }

        async fn save(&self, path: &str, _table: &Table) -> Result<()> {
            Err(PipelineError::OutputWriteFailure {
                path: path.to_string(),
                message: "read-only".to_string(),
            })
        }

        async fn exists(&self, path: &str) -> Result<bool> {
            self.inner.exists(path).await
        }
    }

    fn write_source(dir: &TempDir) -> String {
        let path = dir.path().join("x1.csv");
        std::fs::write(&path, "a,b,c\n1,4,100\n").unwrap();
        path.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_shutdown_with_missing_sources() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("x3.csv");

        let handle = Pipeline::new(Arc::new(CsvTableStore::new()), output.to_str().unwrap())
            .with_source(temp_dir.path().join("x1.csv").to_str().unwrap())
            .with_poll_interval(Duration::from_millis(5))
            .spawn();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let report = handle.shutdown().await;
        assert_eq!(report.producers.len(), 1);
        assert!(report.producers[0].1.failed_passes >= 1);
        assert_eq!(report.rows_enqueued(), 0);
        assert_eq!(report.sink.rows_persisted, 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_sink_stops_once_all_sources_are_gone() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("x3.csv");

        // 沒有 producer：佇列一開始就關閉
        let handle = Pipeline::new(Arc::new(CsvTableStore::new()), output.to_str().unwrap()).spawn();
        let report = tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .unwrap();
        assert!(report.producers.is_empty());
        assert_eq!(report.sink.rows_persisted, 0);
    }

    #[tokio::test]
    async fn test_drain_timeout_accounts_for_every_row() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(&temp_dir);
        let output = temp_dir.path().join("x3.csv");
        let store = Arc::new(ReadOnlyStore {
            inner: CsvTableStore::new(),
        });

        let handle = Pipeline::new(store, output.to_str().unwrap())
            .with_source(source)
            .with_poll_interval(Duration::from_millis(10))
            .with_retry_delay(Duration::from_millis(5))
            .with_policy(PersistFailurePolicy::Retry)
            .with_drain_timeout(Duration::from_millis(50))
            .spawn();
        tokio::time::sleep(Duration::from_millis(40)).await;

        // sink 永遠寫不出去，只能靠 drain timeout 收尾
        let report = tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .unwrap();
        assert!(report.rows_enqueued() >= 1);
        assert_eq!(report.sink.rows_persisted, 0);
        assert!(report.sink.persist_retries >= 1);
        assert_eq!(
            report.sink.rows_persisted + report.sink.rows_dropped,
            report.rows_enqueued()
        );
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_root_token_stops_every_task() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(&temp_dir);
        let output = temp_dir.path().join("x3.csv");

        let handle = Pipeline::new(Arc::new(CsvTableStore::new()), output.to_str().unwrap())
            .with_source(source)
            .with_poll_interval(Duration::from_millis(10))
            .with_drain_timeout(Duration::from_secs(30))
            .spawn();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let cancel = handle.cancellation_token();
        cancel.cancel();
        // 不必等到 drain timeout
        let report = tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .unwrap();
        assert_eq!(report.producers.len(), 1);
        assert!(report.rows_enqueued() >= 1);
        assert!(report.sink.rows_persisted + report.sink.rows_dropped <= report.rows_enqueued());
    }
}
