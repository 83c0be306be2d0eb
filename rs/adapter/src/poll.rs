use crate::config::{Config, PollTarget};
use crate::error_types::{LaneError, PermissionError, StartupError};
use crate::fetch::fetch_metrics;
use crate::message::{MetricsMessage, MESSAGE_VERSION};
use crate::metrics::RelayMetrics;
use crate::publish::MetricsPublisher;
use crate::transform::transform;
use slog::{info, warn, Logger};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Everything a poll lane needs, created once at startup and shared
/// immutably across all lanes and cycles.
pub struct RelayContext {
    pub config: Config,
    /// Scrape client, built with the configured request timeout.
    pub scrape_client: reqwest::Client,
    pub publisher: Arc<dyn MetricsPublisher>,
    pub metrics: RelayMetrics,
    pub log: Logger,
}

/// Startup validation: every configured target must be publishable to and
/// reachable before polling begins. Any failure aborts the process so the
/// operator can fix the deployment before partial operation occurs.
pub async fn validate_startup(ctx: &RelayContext) -> Result<(), StartupError> {
    for target in &ctx.config.targets {
        info!(
            ctx.log,
            "{}: checking publish permission on {}", target.display_name, target.channel
        );
        match ctx.publisher.has_publish_permission(target.channel).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(PermissionError::Denied { channel: target.channel }.into());
            }
            Err(source) => {
                return Err(PermissionError::Check { channel: target.channel, source }.into());
            }
        }

        info!(
            ctx.log,
            "{}: checking that the metrics endpoint is accessible at {}",
            target.display_name,
            target.url
        );
        fetch_metrics(&ctx.scrape_client, &target.url)
            .await
            .map_err(|source| StartupError::Unreachable {
                target: target.display_name.clone(),
                url: target.url.clone(),
                source,
            })?;
    }

    info!(ctx.log, "startup validation passed");
    Ok(())
}

/// Runs one poll cycle: one detached lane per target. Lanes are independent;
/// a failing lane never affects its siblings or future cycles. The returned
/// handles are not awaited by the cycle driver (tests join them).
pub fn run_cycle(ctx: &Arc<RelayContext>) -> Vec<JoinHandle<()>> {
    ctx.metrics.cycles_started.inc();
    ctx.config
        .targets
        .iter()
        .cloned()
        .map(|target| {
            let ctx = Arc::clone(ctx);
            tokio::spawn(async move { run_lane(&ctx, &target).await })
        })
        .collect()
}

/// Drives repeated cycles: one immediately on start, then one per poll
/// interval. The driver never waits for a cycle's lanes to finish, so
/// overlapping cycles are accepted when a lane is unusually slow.
pub async fn run_poll_loop(ctx: Arc<RelayContext>) {
    let mut ticker = interval(ctx.config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let _lanes = run_cycle(&ctx);
    }
}

/// One lane: fetch, transform, publish. All errors are caught here, logged
/// with the target's display name and counted; the next scheduled cycle is
/// the only retry mechanism.
async fn run_lane(ctx: &RelayContext, target: &PollTarget) {
    match poll_target(ctx, target).await {
        Ok(()) => {
            ctx.metrics
                .lane_outcomes
                .with_label_values(&[&target.node_name, "success"])
                .inc();
            info!(ctx.log, "{}: Success", target.display_name);
        }
        Err(err) => {
            ctx.metrics
                .lane_outcomes
                .with_label_values(&[&target.node_name, err.status_label()])
                .inc();
            warn!(ctx.log, "{}: {}", target.display_name, err);
        }
    }
}

async fn poll_target(ctx: &RelayContext, target: &PollTarget) -> Result<(), LaneError> {
    let started = Instant::now();
    let records = fetch_metrics(&ctx.scrape_client, &target.url).await?;
    ctx.metrics
        .fetch_duration
        .with_label_values(&[&target.node_name])
        .observe(started.elapsed().as_secs_f64());

    let metrics = transform(&records, ctx.config.max_metrics_length);
    for (name, measurable) in &metrics {
        if let Some(error) = &measurable.error {
            warn!(ctx.log, "{}: metric {}: {}", target.display_name, name, error);
        }
    }

    let message = MetricsMessage {
        version: MESSAGE_VERSION,
        validator: target.node_name.clone(),
        metrics,
    };
    ctx.publisher.publish(target.channel, &message).await?;
    Ok(())
}
