//! Metric routing: evaluate a batch of samples and push it.
//!
//! [`MetricRouter::route`] is one submission cycle. It classifies every
//! recognised sample, formats the results into one payload and hands that
//! payload to the session exactly once.

use nsca_core::checks::{evaluate, Thresholds};
use nsca_core::message::build_batch;
use nsca_core::metric::Metric;

use crate::error::AgentResult;
use crate::session::NscaSession;
use crate::transport::Transport;

/// Routes metric samples through the classifier and message builder.
#[derive(Debug, Clone)]
pub struct MetricRouter {
    thresholds: Thresholds,
}

impl MetricRouter {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Format `metrics` into a batch without sending it.
    ///
    /// Unrecognised or unusable samples contribute nothing.
    pub fn batch(&self, metrics: &[Metric]) -> Vec<u8> {
        let results = evaluate(metrics, &self.thresholds);
        tracing::debug!(
            metrics = metrics.len(),
            results = results.len(),
            "Evaluated metric batch",
        );
        build_batch(&results)
    }

    /// Build the batch for `metrics` and push it over `session`.
    ///
    /// Exactly one `PUSH` is issued per call, also when no sample produced
    /// a result. Returns the payload that was sent.
    pub fn route<T: Transport>(
        &self,
        metrics: &[Metric],
        session: &mut NscaSession<T>,
    ) -> AgentResult<Vec<u8>> {
        let payload = self.batch(metrics);
        session.push_batch(&payload)?;
        Ok(payload)
    }
}
