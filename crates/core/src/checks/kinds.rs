//! Recognised metric kinds and how each one becomes a check.
//!
//! Every kind knows which fields it needs, which value is compared against
//! the thresholds, the service label it reports under, and how the plugin
//! output text reads.

use crate::error::CoreError;
use crate::metric::Metric;
use crate::metric_names::{
    CPU_TOTAL, FIELD_LOAD1, FIELD_LOAD15, FIELD_LOAD5, FIELD_USAGE_GUEST, FIELD_USAGE_SYSTEM,
    FIELD_USAGE_USER, FIELD_USED_PERCENT, METRIC_CPU, METRIC_DISK, METRIC_MEM, METRIC_SYSTEM,
    TAG_CPU, TAG_PATH,
};
use crate::status::Status;

/// Metric kinds the evaluator turns into checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Load average; classified on the 1-minute value.
    System,
    /// Aggregated CPU usage; classified on user + system + guest.
    Cpu,
    /// Memory usage percentage.
    Mem,
    /// Disk usage percentage of one mount point.
    Disk,
}

/// A metric reduced to the value under test plus how to present it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub service: String,
    render: Render,
}

#[derive(Debug, Clone, PartialEq)]
enum Render {
    LoadAverage([f64; 3]),
    CpuTotal,
    Usage(&'static str),
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::System,
        MetricKind::Cpu,
        MetricKind::Mem,
        MetricKind::Disk,
    ];

    /// Look up a kind by measurement name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Measurement name, also the key in the threshold configuration.
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::System => METRIC_SYSTEM,
            MetricKind::Cpu => METRIC_CPU,
            MetricKind::Mem => METRIC_MEM,
            MetricKind::Disk => METRIC_DISK,
        }
    }

    /// Extract the value under test from `metric`.
    ///
    /// Returns `Ok(None)` when the sample is of this kind but not one that
    /// is checked (a per-core `cpu` row). Missing or non-numeric required
    /// fields are a [`CoreError::Classification`].
    pub fn read(self, metric: &Metric) -> Result<Option<Reading>, CoreError> {
        let reading = match self {
            MetricKind::System => {
                let loads = [
                    metric.numeric_field(FIELD_LOAD1)?,
                    metric.numeric_field(FIELD_LOAD5)?,
                    metric.numeric_field(FIELD_LOAD15)?,
                ];
                Reading {
                    value: loads[0],
                    service: "CPU Load".to_string(),
                    render: Render::LoadAverage(loads),
                }
            }
            MetricKind::Cpu => {
                if metric.tag(TAG_CPU) != Some(CPU_TOTAL) {
                    return Ok(None);
                }
                let total = metric.numeric_field(FIELD_USAGE_USER)?
                    + metric.numeric_field(FIELD_USAGE_SYSTEM)?
                    + metric.numeric_field(FIELD_USAGE_GUEST)?;
                Reading {
                    value: total,
                    service: "CPU Load".to_string(),
                    render: Render::CpuTotal,
                }
            }
            MetricKind::Mem => Reading {
                value: metric.numeric_field(FIELD_USED_PERCENT)?,
                service: "Memory".to_string(),
                render: Render::Usage("Memory"),
            },
            MetricKind::Disk => {
                let service = match metric.tag(TAG_PATH) {
                    Some(path) if !path.is_empty() => format!("Disk Space {path}"),
                    _ => "Disk Space".to_string(),
                };
                Reading {
                    value: metric.numeric_field(FIELD_USED_PERCENT)?,
                    service,
                    render: Render::Usage("Disk"),
                }
            }
        };
        Ok(Some(reading))
    }
}

impl Reading {
    /// Plugin output text for this reading in the given state.
    pub fn message(&self, status: Status) -> String {
        match &self.render {
            Render::LoadAverage([l1, l5, l15]) => {
                format!("load average: {l1:.6},{l5:.6},{l15:.6}")
            }
            Render::CpuTotal => format!("load average: {:.6}", self.value),
            Render::Usage(label) => format!("{label} : {status} - {:.2}% used", self.value),
        }
    }
}
