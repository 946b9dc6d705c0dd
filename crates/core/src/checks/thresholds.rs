//! Threshold classification for passive checks.
//!
//! Pure logic. The caller supplies the sample and the bounds; nothing here
//! touches the network or the clock.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::status::Status;
use crate::threshold_validation::validate_threshold_pair;

/// Warning/critical bounds for one metric kind, with `warning <= critical`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    warning: f64,
    critical: f64,
}

/// Threshold configuration keyed by metric kind name (see
/// [`crate::metric_names`]).
pub type Thresholds = HashMap<String, ThresholdConfig>;

impl ThresholdConfig {
    /// Build a threshold pair, rejecting non-finite or inverted bounds.
    pub fn new(warning: f64, critical: f64) -> Result<Self, CoreError> {
        validate_threshold_pair(warning, critical, "threshold")?;
        Ok(Self { warning, critical })
    }

    pub fn warning(&self) -> f64 {
        self.warning
    }

    pub fn critical(&self) -> f64 {
        self.critical
    }

    /// Classify `value` against this pair. See [`classify`].
    pub fn classify(&self, value: f64) -> Result<Status, CoreError> {
        classify(value, self.warning, self.critical)
    }
}

/// Map a sample onto a check state.
///
/// * `value < warning` is OK
/// * `warning <= value < critical` is WARNING
/// * `value >= critical` is CRITICAL
///
/// When `warning == critical` the warning band is empty. NaN and infinite
/// samples are rejected with [`CoreError::Classification`].
pub fn classify(value: f64, warning: f64, critical: f64) -> Result<Status, CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Classification(format!(
            "cannot classify non-finite value {value}"
        )));
    }

    let status = if value >= critical {
        Status::Critical
    } else if value >= warning {
        Status::Warning
    } else {
        Status::Ok
    };
    Ok(status)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
