//! Host metrics collection via `sysinfo`.
//!
//! [`MetricsCollector`] samples the local load average, memory usage and
//! per-mount disk usage and emits them as `system`, `mem` and `disk`
//! [`Metric`]s tagged with the reporting host name.
//!
//! Load average is not available on every platform (sysinfo reports zeros
//! on Windows); the collector still emits it and lets the thresholds decide.

use chrono::Utc;
use nsca_core::metric::Metric;
use nsca_core::metric_names::{
    FIELD_LOAD1, FIELD_LOAD15, FIELD_LOAD5, FIELD_USED_PERCENT, METRIC_DISK, METRIC_MEM,
    METRIC_SYSTEM, TAG_HOST, TAG_PATH,
};
use sysinfo::{Disks, System};

/// Host name used when neither configuration nor the OS provides one.
const FALLBACK_HOSTNAME: &str = "localhost";

/// Samples host metrics on demand.
pub struct MetricsCollector {
    hostname: String,
    sys: System,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MetricsCollector {
    /// Create a collector reporting as `hostname`, or as the system host
    /// name when `None`.
    pub fn new(hostname: Option<String>) -> Self {
        let hostname = hostname
            .or_else(System::host_name)
            .unwrap_or_else(|| {
                tracing::warn!("Could not determine host name, using {FALLBACK_HOSTNAME}");
                FALLBACK_HOSTNAME.to_string()
            });
        tracing::info!(hostname = %hostname, "Metrics collector initialised");

        Self {
            hostname,
            sys: System::new(),
        }
    }

    /// Host name written into the `host` tag of every sample.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Collect one snapshot: load average, memory, then one sample per disk.
    pub fn collect(&mut self) -> Vec<Metric> {
        let now = Utc::now();
        let mut metrics = Vec::new();

        let load = System::load_average();
        metrics.push(
            Metric::now(METRIC_SYSTEM)
                .with_timestamp(now)
                .with_tag(TAG_HOST, self.hostname.as_str())
                .with_field(FIELD_LOAD1, load.one)
                .with_field(FIELD_LOAD5, load.five)
                .with_field(FIELD_LOAD15, load.fifteen),
        );

        self.sys.refresh_memory();
        if let Some(used_percent) = percent(self.sys.used_memory(), self.sys.total_memory()) {
            metrics.push(
                Metric::now(METRIC_MEM)
                    .with_timestamp(now)
                    .with_tag(TAG_HOST, self.hostname.as_str())
                    .with_field(FIELD_USED_PERCENT, used_percent),
            );
        }

        let disks = Disks::new_with_refreshed_list();
        for disk in disks.list() {
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            let Some(used_percent) = percent(used, total) else {
                continue;
            };
            metrics.push(
                Metric::now(METRIC_DISK)
                    .with_timestamp(now)
                    .with_tag(TAG_HOST, self.hostname.as_str())
                    .with_tag(TAG_PATH, disk.mount_point().to_string_lossy())
                    .with_field(FIELD_USED_PERCENT, used_percent),
            );
        }

        tracing::debug!(samples = metrics.len(), "Collected host metrics");
        metrics
    }
}

/// `used / total` as a percentage, or `None` for an empty total.
fn percent(used: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| used as f64 * 100.0 / total as f64)
}
