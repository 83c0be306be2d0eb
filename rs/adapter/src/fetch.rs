use crate::error_types::{CollectError, FetchError, ParseError};
use crate::message::{BucketCount, MetricSample, MetricType, QuantileCount, SampleValue};
use prometheus_parse::{Scrape, Value};
use reqwest::Client;
use std::collections::HashMap;
use url::Url;

/// One metric as scraped from a target: the parser's flat sample list
/// regrouped under the metric name, in first-appearance order.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedMetricRecord {
    pub name: String,
    /// May be empty; the transformer drops empty help strings.
    pub help: String,
    pub metric_type: MetricType,
    pub samples: Vec<MetricSample>,
}

/// Performs one GET against a target's metrics endpoint and parses the body.
/// The request timeout is carried by the client. No retries at this layer;
/// the next scheduled cycle is the retry.
pub async fn fetch_metrics(
    client: &Client,
    url: &Url,
) -> Result<Vec<ParsedMetricRecord>, CollectError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| FetchError::Request { url: url.clone(), source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status { url: url.clone(), status }.into());
    }

    let body = response
        .text()
        .await
        .map_err(|source| FetchError::Request { url: url.clone(), source })?;

    Ok(parse_exposition(&body)?)
}

/// Parses exposition text into per-metric records. The parser yields one flat
/// sample list; samples are regrouped by metric name and the record type is
/// derived from the parser's value variant.
pub fn parse_exposition(body: &str) -> Result<Vec<ParsedMetricRecord>, ParseError> {
    let lines = body.lines().map(|line| Ok(line.to_string()));
    let scrape = Scrape::parse(lines)?;

    let mut records: Vec<ParsedMetricRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for sample in scrape.samples {
        let (metric_type, value) = convert_value(sample.value);
        let entry = MetricSample {
            labels: sample
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            value,
        };

        match index.get(&sample.metric) {
            Some(&at) => records[at].samples.push(entry),
            None => {
                index.insert(sample.metric.clone(), records.len());
                let help = scrape.docs.get(&sample.metric).cloned().unwrap_or_default();
                records.push(ParsedMetricRecord {
                    name: sample.metric,
                    help,
                    metric_type,
                    samples: vec![entry],
                });
            }
        }
    }

    Ok(records)
}

fn convert_value(value: Value) -> (MetricType, SampleValue) {
    match value {
        Value::Counter(v) => (MetricType::Counter, SampleValue::Scalar(v)),
        Value::Gauge(v) => (MetricType::Gauge, SampleValue::Scalar(v)),
        Value::Untyped(v) => (MetricType::Untyped, SampleValue::Scalar(v)),
        Value::Histogram(buckets) => (
            MetricType::Histogram,
            SampleValue::Histogram(
                buckets
                    .into_iter()
                    .map(|bucket| BucketCount {
                        le: format_bound(bucket.less_than),
                        count: bucket.count,
                    })
                    .collect(),
            ),
        ),
        Value::Summary(quantiles) => (
            MetricType::Summary,
            SampleValue::Summary(
                quantiles
                    .into_iter()
                    .map(|quantile| QuantileCount {
                        quantile: quantile.quantile,
                        count: quantile.count,
                    })
                    .collect(),
            ),
        ),
    }
}

fn format_bound(bound: f64) -> String {
    if bound == f64::INFINITY {
        "+Inf".to_string()
    } else {
        format!("{}", bound)
    }
}
