use anyhow::Context;
use clap::Parser;
use row_funnel::utils::{logger, validation::Validate};
use row_funnel::{CliConfig, CsvTableStore, Pipeline};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting row-funnel");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = config.resolve().context("failed to load configuration")?;

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e).context("invalid configuration");
    }

    for source in &settings.sources {
        tracing::info!("📥 Source: {}", source);
    }
    tracing::info!("📁 Output: {}", settings.output);

    let handle = Pipeline::from_config(&settings, Arc::new(CsvTableStore::new())).spawn();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("🛑 Shutdown requested");

    let report = handle.shutdown().await;
    println!(
        "✅ Stopped: {} rows read, {} rows written, {} rows dropped",
        report.rows_enqueued(),
        report.sink.rows_persisted,
        report.sink.rows_dropped
    );

    Ok(())
}
