use crate::fetch::ParsedMetricRecord;
use crate::message::Measurable;
use std::collections::BTreeMap;

/// Converts scraped records into the outbound per-metric map. Pure and
/// infallible: a malformed individual record never rejects the whole batch.
///
/// Per record:
/// 1. type and samples are copied verbatim;
/// 2. help is copied only when non-empty;
/// 3. a record with `samples.len() >= size_limit` has its samples replaced by
///    the empty sequence and an error string recording the original length
///    and the limit. This bounds payload size against endpoints exposing
///    pathologically large histograms or label sets.
///
/// Map keys are record names; should the upstream parser ever yield duplicate
/// names, last write wins.
pub fn transform(
    records: &[ParsedMetricRecord],
    size_limit: usize,
) -> BTreeMap<String, Measurable> {
    let mut out = BTreeMap::new();
    for record in records {
        let help = if record.help.is_empty() {
            None
        } else {
            Some(record.help.clone())
        };

        let (metrics, error) = if record.samples.len() >= size_limit {
            (
                Vec::new(),
                Some(format!(
                    "Metric omitted due to size: {}, limit: {}",
                    record.samples.len(),
                    size_limit
                )),
            )
        } else {
            (record.samples.clone(), None)
        };

        out.insert(
            record.name.clone(),
            Measurable {
                metric_type: record.metric_type,
                help,
                metrics,
                error,
            },
        );
    }
    out
}
