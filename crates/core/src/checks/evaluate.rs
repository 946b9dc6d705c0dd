//! Metric batch evaluation.
//!
//! Turns a sequence of metric samples into check results, in input order.
//! Samples that cannot be checked are skipped rather than failing the batch:
//! unknown kinds, kinds without configured thresholds, samples without a
//! `host` tag and samples whose required fields are missing or non-numeric.

use crate::check_result::CheckResult;
use crate::checks::kinds::MetricKind;
use crate::checks::thresholds::Thresholds;
use crate::error::CoreError;
use crate::metric::Metric;
use crate::metric_names::TAG_HOST;

/// Evaluate `metrics` against `thresholds`.
pub fn evaluate(metrics: &[Metric], thresholds: &Thresholds) -> Vec<CheckResult> {
    metrics
        .iter()
        .filter_map(|metric| match evaluate_one(metric, thresholds) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(metric = metric.name(), error = %e, "Skipping metric");
                None
            }
        })
        .collect()
}

/// Evaluate a single sample.
///
/// `Ok(None)` means the sample is silently not applicable; `Err` means it
/// looked like a checkable sample but was unusable.
fn evaluate_one(metric: &Metric, thresholds: &Thresholds) -> Result<Option<CheckResult>, CoreError> {
    let Some(kind) = MetricKind::from_name(metric.name()) else {
        return Ok(None);
    };
    let Some(threshold) = thresholds.get(kind.name()) else {
        tracing::trace!(kind = kind.name(), "No thresholds configured for metric kind");
        return Ok(None);
    };
    let Some(reading) = kind.read(metric)? else {
        return Ok(None);
    };
    let host = metric.tag(TAG_HOST).ok_or_else(|| {
        CoreError::Classification(format!("{}: missing '{TAG_HOST}' tag", metric.name()))
    })?;

    let status = threshold.classify(reading.value)?;
    let message = reading.message(status);

    CheckResult::new(
        metric.unix_seconds(),
        host,
        reading.service,
        status,
        message,
    )
    .map(Some)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
