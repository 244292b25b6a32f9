use crate::config::PipelineSettings;
use crate::utils::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub sources: Option<SourcesConfig>,
    pub output: Option<OutputConfig>,
    pub schedule: Option<ScheduleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub retry_on_persist_failure: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub poll_interval_secs: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PipelineError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PipelineError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 未填的欄位沿用預設值
    pub fn into_settings(self) -> PipelineSettings {
        let mut settings = PipelineSettings::default();
        if let Some(sources) = self.sources {
            settings.sources = sources.paths;
        }
        if let Some(output) = self.output {
            if let Some(path) = output.path {
                settings.output = path;
            }
            if let Some(retry) = output.retry_on_persist_failure {
                settings.retry_on_persist_failure = retry;
            }
        }
        if let Some(interval) = self.schedule.and_then(|s| s.poll_interval_secs) {
            settings.poll_interval_secs = interval;
        }
        settings
    }
}
