//! One-shot operator tool: grants publish permission on the four well-known
//! channels to a validator's address. Run once per validator before starting
//! the adapter; not part of the running service.

use anyhow::{Context, Result};
use polygon_metrics_adapter::config::{DEFAULT_GATEWAY_URL, METRICS_GATEWAY_URL};
use polygon_metrics_adapter::publish::GatewayPublisher;
use polygon_metrics_adapter::NodeRole;
use slog::{info, o, Drain, Logger};
use std::collections::HashMap;
use url::Url;

/// Admin credential with share permission on the channels.
const PRIVATE_KEY: &str = "PRIVATE_KEY";
/// The address being granted publish permission.
const VALIDATOR_ADDRESS: &str = "VALIDATOR_ADDRESS";

fn make_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).chan_size(8192).build();
    Logger::root(drain.fuse(), o!())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let private_key = env
        .get(PRIVATE_KEY)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("set the admin private key into env variable {}", PRIVATE_KEY))?
        .clone();
    let address = env
        .get(VALIDATOR_ADDRESS)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| {
            format!("set the validator address into env variable {}", VALIDATOR_ADDRESS)
        })?
        .clone();
    let gateway_url = Url::parse(
        env.get(METRICS_GATEWAY_URL)
            .map(String::as_str)
            .unwrap_or(DEFAULT_GATEWAY_URL),
    )
    .context("invalid gateway URL")?;

    let log = make_logger();
    let publisher = GatewayPublisher::new(gateway_url, private_key);

    for role in NodeRole::ALL {
        info!(log, "setting permissions for {}", role.channel());
        publisher
            .grant_publish_permission(&address, role.channel())
            .await
            .with_context(|| format!("failed to grant publish permission on {}", role.channel()))?;
    }

    info!(log, "publish permission granted on all channels"; "address" => address);
    Ok(())
}
