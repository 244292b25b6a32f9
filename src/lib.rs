pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{PipelineSettings, TomlConfig};

pub use adapters::CsvTableStore;
pub use crate::core::{
    pipeline::{Pipeline, PipelineHandle, PipelineReport},
    producer::ProducerWorker,
    queue::{RowQueue, RowReceiver, RowSender},
    sink::OutputSink,
    transform::RowTransformer,
};
pub use domain::model::{Cell, OutputRecord, Row, Table, TransformedRow};
pub use domain::ports::{PersistFailurePolicy, TableStore};
pub use utils::error::{PipelineError, Result};
