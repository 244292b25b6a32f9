#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::{ConfigProvider, PersistFailurePolicy};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

pub const DEFAULT_SOURCES: [&str; 2] = ["resources/x1.csv", "resources/x2.csv"];
pub const DEFAULT_OUTPUT: &str = "resources/x3.csv";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Fully resolved settings the binary hands to [`crate::Pipeline::from_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub sources: Vec<String>,
    pub output: String,
    pub poll_interval_secs: u64,
    pub retry_on_persist_failure: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            output: DEFAULT_OUTPUT.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            retry_on_persist_failure: false,
        }
    }
}

impl ConfigProvider for PipelineSettings {
    fn source_paths(&self) -> &[String] {
        &self.sources
    }

    fn output_path(&self) -> &str {
        &self.output
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn persist_failure_policy(&self) -> PersistFailurePolicy {
        if self.retry_on_persist_failure {
            PersistFailurePolicy::Retry
        } else {
            PersistFailurePolicy::DropRow
        }
    }
}

impl Validate for PipelineSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_list("sources", &self.sources)?;
        for source in &self.sources {
            validation::validate_path("sources", source)?;
        }
        validation::validate_file_extensions("sources", &self.sources, &["csv"])?;

        validation::validate_path("output", &self.output)?;
        validation::validate_file_extensions(
            "output",
            std::slice::from_ref(&self.output),
            &["csv"],
        )?;
        validation::validate_distinct_output("output", &self.output, &self.sources)?;

        validation::validate_positive_number("poll_interval_secs", self.poll_interval_secs, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = PipelineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.source_paths().len(), 2);
        assert_eq!(settings.output_path(), "resources/x3.csv");
        assert_eq!(settings.poll_interval(), Duration::from_secs(2));
        assert_eq!(
            settings.persist_failure_policy(),
            PersistFailurePolicy::DropRow
        );
    }

    #[test]
    fn test_rejects_bad_settings() {
        let mut settings = PipelineSettings::default();
        settings.poll_interval_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = PipelineSettings::default();
        settings.output = settings.sources[0].clone();
        assert!(settings.validate().is_err());

        let mut settings = PipelineSettings::default();
        settings.sources.clear();
        assert!(settings.validate().is_err());

        let mut settings = PipelineSettings::default();
        settings.output = "resources/x3.xlsx".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_retry_flag_selects_policy() {
        let settings = PipelineSettings {
            retry_on_persist_failure: true,
            ..PipelineSettings::default()
        };
        assert_eq!(settings.persist_failure_policy(), PersistFailurePolicy::Retry);
    }
}
