//! Passive check evaluation.
//!
//! Contains the threshold classifier, the per-kind field extraction and the
//! evaluator that turns a batch of metrics into check results. All logic in
//! this module is pure so it can be tested without a server.

pub mod evaluate;
pub mod kinds;
pub mod thresholds;

pub use evaluate::evaluate;
pub use kinds::MetricKind;
pub use thresholds::{classify, ThresholdConfig, Thresholds};
