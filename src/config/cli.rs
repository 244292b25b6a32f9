use crate::config::{PipelineSettings, TomlConfig};
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "row-funnel")]
#[command(about = "Poll CSV tables, double their numbers and append every row to one output table")]
pub struct CliConfig {
    /// Source tables, comma separated
    #[arg(long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Output table
    #[arg(long)]
    pub output: Option<String>,

    /// Seconds between passes over each source
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    /// Keep a row whose write failed and retry it instead of dropping it
    #[arg(long)]
    pub retry_on_persist_failure: bool,

    /// TOML configuration file; command-line values win over it
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn resolve(&self) -> Result<PipelineSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                TomlConfig::from_file(path)?.into_settings()
            }
            None => PipelineSettings::default(),
        };

        if !self.sources.is_empty() {
            settings.sources = self.sources.clone();
        }
        if let Some(output) = &self.output {
            settings.output = output.clone();
        }
        if let Some(interval) = self.poll_interval_secs {
            settings.poll_interval_secs = interval;
        }
        if self.retry_on_persist_failure {
            settings.retry_on_persist_failure = true;
        }
        Ok(settings)
    }
}
