//! The metrics adapter scrapes the Prometheus endpoints of the local
//! validator and sentry nodes (Heimdall and Bor), reshapes the scraped
//! metrics into a compact JSON envelope and publishes one envelope per node
//! per poll cycle to the well-known channels of the aggregation network.

/// Config settings from command line.
mod cli;
/// This module contains the environment-derived configuration that is
/// resolved once at startup and passed explicitly to the rest of the adapter.
pub mod config;
/// This module contains the error taxonomy of the adapter. Startup errors are
/// fatal and never caught; poll-cycle errors are caught at the lane boundary.
pub mod error_types;
/// This module fetches one metrics endpoint and regroups the parsed samples
/// into per-metric records.
pub mod fetch;
/// This module contains the JSON envelope published to the aggregation
/// network.
pub mod message;
/// Self-observability counters for the adapter itself.
pub mod metrics;
/// This module drives the poll cycles: one independent lane per target,
/// repeated at a fixed interval.
pub mod poll;
/// This module contains the publish capability the poll lanes hand their
/// envelopes to.
pub mod publish;
/// This module reshapes per-metric records into the outbound envelope map.
pub mod transform;

pub use cli::Flags;
pub use config::{Config, NodeRole, PollTarget};
pub use poll::RelayContext;
