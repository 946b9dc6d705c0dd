//! Agent configuration loaded from environment variables.

use std::time::Duration;

use nsca_core::checks::{ThresholdConfig, Thresholds};
use nsca_core::error::CoreError;
use nsca_core::metric_names::{METRIC_CPU, METRIC_DISK, METRIC_MEM, METRIC_SYSTEM};
use nsca_core::threshold_validation::parse_threshold_pair;

use crate::session::SessionOptions;
use crate::transport::{PskCredentials, DEFAULT_CIPHERS};

/// Default seconds between check submissions.
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default connect and I/O timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Built-in `(warning, critical)` pairs per metric kind.
const DEFAULT_THRESHOLDS: [(&str, f64, f64); 4] = [
    (METRIC_SYSTEM, 3.6, 4.0),
    (METRIC_CPU, 80.0, 90.0),
    (METRIC_MEM, 85.0, 95.0),
    (METRIC_DISK, 85.0, 95.0),
];

/// Everything the agent needs to run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// NSCA-ng server as `host:port`.
    pub server: String,
    pub credentials: PskCredentials,
    pub session: SessionOptions,
    /// Host name reported in check results; `None` uses the system name.
    pub hostname: Option<String>,
    /// Time between collection + push cycles.
    pub interval: Duration,
    pub thresholds: Thresholds,
}

impl AgentConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                     | Default              |
    /// |-----------------------------|----------------------|
    /// | `NSCA_SERVER`               | required             |
    /// | `NSCA_PSK_IDENTITY`         | required             |
    /// | `NSCA_PSK_KEY`              | required             |
    /// | `NSCA_CIPHERS`              | `PSK-AES256-CBC-SHA` |
    /// | `NSCA_CONNECT_TIMEOUT_SECS` | `10` (`0` = none)    |
    /// | `NSCA_IO_TIMEOUT_SECS`      | `10` (`0` = none)    |
    /// | `NSCA_AWAIT_REPLY`          | `false`              |
    /// | `NSCA_HOSTNAME`             | system host name     |
    /// | `CHECK_INTERVAL_SECS`       | `60`                 |
    /// | `THRESHOLD_<KIND>`          | see below            |
    ///
    /// `THRESHOLD_SYSTEM`, `THRESHOLD_CPU`, `THRESHOLD_MEM` and
    /// `THRESHOLD_DISK` take `warning,critical` and default to `3.6,4.0`,
    /// `80,90`, `85,95` and `85,95`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| CoreError::Config(format!("{key} must be set")))
        };

        let server = require("NSCA_SERVER")?;
        if !server.contains(':') {
            return Err(CoreError::Config(format!(
                "NSCA_SERVER must be host:port, got '{server}'"
            )));
        }

        let credentials =
            PskCredentials::new(require("NSCA_PSK_IDENTITY")?, require("NSCA_PSK_KEY")?)?;

        let session = SessionOptions {
            connect_timeout: parse_timeout(get("NSCA_CONNECT_TIMEOUT_SECS"), "NSCA_CONNECT_TIMEOUT_SECS")?,
            io_timeout: parse_timeout(get("NSCA_IO_TIMEOUT_SECS"), "NSCA_IO_TIMEOUT_SECS")?,
            await_handshake_reply: parse_bool(get("NSCA_AWAIT_REPLY"), "NSCA_AWAIT_REPLY")?,
            ciphers: get("NSCA_CIPHERS").unwrap_or_else(|| DEFAULT_CIPHERS.to_string()),
        };

        let interval_secs = match get("CHECK_INTERVAL_SECS") {
            Some(raw) => parse_u64(&raw, "CHECK_INTERVAL_SECS")?,
            None => DEFAULT_INTERVAL_SECS,
        };
        if interval_secs == 0 {
            return Err(CoreError::Config(
                "CHECK_INTERVAL_SECS must be greater than zero".into(),
            ));
        }

        let mut thresholds = Thresholds::new();
        for (kind, warning, critical) in DEFAULT_THRESHOLDS {
            let key = format!("THRESHOLD_{}", kind.to_ascii_uppercase());
            let (warning, critical) = match get(&key) {
                Some(raw) => parse_threshold_pair(&raw, &key)?,
                None => (warning, critical),
            };
            thresholds.insert(kind.to_string(), ThresholdConfig::new(warning, critical)?);
        }

        Ok(Self {
            server,
            credentials,
            session,
            hostname: get("NSCA_HOSTNAME"),
            interval: Duration::from_secs(interval_secs),
            thresholds,
        })
    }
}

fn parse_u64(raw: &str, key: &str) -> Result<u64, CoreError> {
    raw.parse()
        .map_err(|_| CoreError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

/// Seconds to a timeout; `0` disables it.
fn parse_timeout(raw: Option<String>, key: &str) -> Result<Option<Duration>, CoreError> {
    let secs = match raw {
        Some(raw) => parse_u64(&raw, key)?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn parse_bool(raw: Option<String>, key: &str) -> Result<bool, CoreError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(CoreError::Config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}
