use anyhow::{Context, Result};
use clap::Parser;
use polygon_metrics_adapter::metrics::RelayMetrics;
use polygon_metrics_adapter::poll::{run_poll_loop, validate_startup};
use polygon_metrics_adapter::publish::GatewayPublisher;
use polygon_metrics_adapter::{Config, Flags, RelayContext};
use prometheus::Registry;
use slog::{info, o, Drain, Logger};
use std::collections::HashMap;
use std::sync::Arc;

fn make_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).chan_size(8192).build();
    Logger::root(drain.fuse(), o!())
}

#[tokio::main]
async fn main() -> Result<()> {
    let flags = Flags::parse();
    let env: HashMap<String, String> = std::env::vars().collect();
    let config = Config::from_env(&env)?;

    let log = make_logger();
    info!(
        log,
        "starting the metrics adapter";
        "targets" => config.targets.len(),
        "poll_interval_s" => config.poll_interval.as_secs(),
        "request_timeout_s" => config.request_timeout.as_secs()
    );
    for target in &config.targets {
        info!(log, "{} -> {}", target.display_name, target.channel);
    }

    let scrape_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("failed to build the scrape HTTP client")?;
    let publisher = Arc::new(GatewayPublisher::new(
        config.gateway_url.clone(),
        config.private_key.clone(),
    ));
    let registry = Registry::new();
    let metrics = RelayMetrics::new(&registry);

    let ctx = Arc::new(RelayContext {
        config,
        scrape_client,
        publisher,
        metrics,
        log: log.clone(),
    });

    validate_startup(&ctx).await?;

    if flags.test_config {
        info!(log, "configuration test passed");
        return Ok(());
    }

    info!(log, "starting the metrics polling");
    run_poll_loop(ctx).await;
    Ok(())
}
