use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source table not found: {path}")]
    SourceNotFound { path: String },

    #[error("Source table {path} is not a readable table: {message}")]
    SourceCorrupt { path: String, message: String },

    #[error("Failed to write output table {path}: {message}")]
    OutputWriteFailure { path: String, message: String },

    #[error("Wait for the next row was interrupted")]
    InterruptedWait,

    #[error("Row queue is closed: the consumer has shut down")]
    QueueClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl PipelineError {
    /// 可在下一輪重試的錯誤（來源或輸出暫時不可用）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceNotFound { .. }
                | PipelineError::SourceCorrupt { .. }
                | PipelineError::OutputWriteFailure { .. }
                | PipelineError::IoError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
