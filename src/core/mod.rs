pub mod pipeline;
pub mod producer;
pub mod queue;
pub mod sink;
pub mod transform;

pub use crate::domain::model::{Cell, Row, Table, TransformedRow};
pub use crate::domain::ports::{ConfigProvider, PersistFailurePolicy, TableStore};
pub use crate::utils::error::Result;
