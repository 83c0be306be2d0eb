use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, HistogramVec, IntCounter, IntCounterVec, Registry,
};

const METRIC_PREFIX: &str = "telemetry_relay";

/// Self-observability counters for the adapter. Registered once against the
/// registry created in `main` and shared read-only by all lanes.
#[derive(Clone)]
pub struct RelayMetrics {
    /// Poll cycles started since process start.
    pub cycles_started: IntCounter,
    /// Lane outcomes by target and status
    /// (success, fetch_error, parse_error, publish_error).
    pub lane_outcomes: IntCounterVec,
    /// Scrape duration per target, successful fetches only.
    pub fetch_duration: HistogramVec,
}

impl RelayMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            cycles_started: register_int_counter_with_registry!(
                format!("{METRIC_PREFIX}_cycles_started"),
                "Number of poll cycles started.",
                registry
            )
            .unwrap(),

            lane_outcomes: register_int_counter_vec_with_registry!(
                format!("{METRIC_PREFIX}_lane_outcomes"),
                "Per-target poll lane outcomes.",
                &["target", "status"],
                registry
            )
            .unwrap(),

            fetch_duration: register_histogram_vec_with_registry!(
                format!("{METRIC_PREFIX}_fetch_duration_seconds"),
                "Duration of successful metrics fetches.",
                &["target"],
                registry
            )
            .unwrap(),
        }
    }
}
