//! Well-known metric, field and tag name constants.
//!
//! These are the measurement names produced by the collector (and by
//! Telegraf-style inputs), the field keys read by the check evaluator, and
//! the kind names used as keys in the threshold configuration.

/// Load average measurement (`load1`, `load5`, `load15`).
pub const METRIC_SYSTEM: &str = "system";

/// Per-CPU or aggregated CPU usage percentages.
pub const METRIC_CPU: &str = "cpu";

/// Memory usage.
pub const METRIC_MEM: &str = "mem";

/// Per-mount disk usage.
pub const METRIC_DISK: &str = "disk";

pub const FIELD_LOAD1: &str = "load1";
pub const FIELD_LOAD5: &str = "load5";
pub const FIELD_LOAD15: &str = "load15";

pub const FIELD_USAGE_USER: &str = "usage_user";
pub const FIELD_USAGE_SYSTEM: &str = "usage_system";
pub const FIELD_USAGE_GUEST: &str = "usage_guest";

/// Used space (or memory) as a percentage of the total.
pub const FIELD_USED_PERCENT: &str = "used_percent";

/// Host the sample was taken on; becomes the check-result host name.
pub const TAG_HOST: &str = "host";

/// CPU selector tag; only the aggregated row is checked.
pub const TAG_CPU: &str = "cpu";

/// Value of [`TAG_CPU`] for the aggregate over all cores.
pub const CPU_TOTAL: &str = "cpu-total";

/// Mount point of a `disk` sample.
pub const TAG_PATH: &str = "path";
