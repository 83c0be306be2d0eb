use serde::Serialize;
use std::collections::BTreeMap;

/// Wire version of [`MetricsMessage`].
pub const MESSAGE_VERSION: u32 = 1;

/// Metric type as reported by the scraped endpoint's exposition text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricType {
    Gauge,
    Counter,
    Summary,
    Histogram,
    Untyped,
}

/// One histogram bucket. `le` mirrors the exposition label and is kept as a
/// string because the `+Inf` bucket has no JSON number representation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BucketCount {
    pub le: String,
    pub count: f64,
}

/// One summary quantile.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuantileCount {
    pub quantile: f64,
    pub count: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SampleValue {
    Scalar(f64),
    Histogram(Vec<BucketCount>),
    Summary(Vec<QuantileCount>),
}

/// One sample of one metric: its label set (omitted when empty) and value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricSample {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub value: SampleValue,
}

/// Outbound per-metric representation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Measurable {
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    /// Omitted entirely when the source help string is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// The sample sequence, or empty when the metric was omitted for size.
    pub metrics: Vec<MetricSample>,
    /// Present only when the metric was omitted for size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One publish payload: everything one target exposed in one poll cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsMessage {
    pub version: u32,
    /// The node name of the originating target.
    pub validator: String,
    pub metrics: BTreeMap<String, Measurable>,
}
