//! DealWatch - centralized vs decentralized deal aggregation demo.

use anyhow::Context;
use dealwatch::{App, Config};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load_or_default().context("failed to load configuration")?;

    // Initialize logging
    let _guard = init_logging(&config)?;

    // Run both models and print the comparison
    let reports = App::new(config).run().await?;
    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(())
}

fn init_logging(
    config: &Config,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.logging.filter.clone().into())
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(filter());

    if !config.logging.file_logging {
        tracing_subscriber::registry().with(console).init();
        return Ok(None);
    }

    let dir = match &config.logging.log_dir {
        Some(dir) => dir.clone(),
        None => dealwatch::config::log_dir()?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(&dir, "dealwatch.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter());

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(Some(guard))
}
