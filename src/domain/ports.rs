use crate::domain::model::Table;
use crate::utils::error::Result;
use std::time::Duration;

/// Load / save whole tables. Implementations keep no state between calls, so
/// one store can be shared by every producer and the sink.
pub trait TableStore: Send + Sync {
    fn load(&self, path: &str) -> impl std::future::Future<Output = Result<Table>> + Send;
    fn save(
        &self,
        path: &str,
        table: &Table,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistFailurePolicy {
    /// Log and forget the in-flight row.
    #[default]
    DropRow,
    /// Keep the in-flight row and try it again before dequeuing anything new.
    Retry,
}

pub trait ConfigProvider: Send + Sync {
    fn source_paths(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn poll_interval(&self) -> Duration;
    fn persist_failure_policy(&self) -> PersistFailurePolicy;
}
