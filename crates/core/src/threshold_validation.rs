//! Shared threshold validation helpers.
//!
//! Used by [`ThresholdConfig::new`](crate::checks::thresholds::ThresholdConfig::new)
//! and by the agent's configuration loader.

use crate::error::CoreError;

/// Validate a `(warning, critical)` pair.
///
/// Both bounds must be finite and `warning <= critical`. Returns a
/// `CoreError::Config` naming the offending metric kind otherwise.
pub fn validate_threshold_pair(warning: f64, critical: f64, name: &str) -> Result<(), CoreError> {
    if !warning.is_finite() || !critical.is_finite() {
        return Err(CoreError::Config(format!(
            "{name}: thresholds must be finite numbers, got warning={warning} critical={critical}"
        )));
    }
    if warning > critical {
        return Err(CoreError::Config(format!(
            "{name}: warning threshold {warning} exceeds critical threshold {critical}"
        )));
    }
    Ok(())
}

/// Parse a `"warning,critical"` pair as used in `THRESHOLD_<KIND>` variables.
pub fn parse_threshold_pair(raw: &str, name: &str) -> Result<(f64, f64), CoreError> {
    let mut parts = raw.split(',').map(str::trim);
    let (Some(warning), Some(critical), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CoreError::Config(format!(
            "{name}: expected 'warning,critical', got '{raw}'"
        )));
    };

    let parse = |s: &str| {
        s.parse::<f64>().map_err(|_| {
            CoreError::Config(format!("{name}: '{s}' is not a valid number"))
        })
    };

    let (warning, critical) = (parse(warning)?, parse(critical)?);
    validate_threshold_pair(warning, critical, name)?;
    Ok((warning, critical))
}
