//! Passive check results submitted to the NSCA-ng server.

use crate::error::CoreError;
use crate::message;
use crate::status::Status;
use crate::types::UnixSeconds;

/// Field delimiter of the `PROCESS_SERVICE_CHECK_RESULT` external command.
pub const FIELD_DELIMITER: char = ';';

/// Host and service names end up between `;` delimiters on a single line,
/// so neither may be empty or contain the delimiter or a line break.
fn is_safe_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains([FIELD_DELIMITER, '\n', '\r'])
}

/// One service state update for one host.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    timestamp: UnixSeconds,
    hostname: String,
    service: String,
    status: Status,
    message: String,
}

impl CheckResult {
    /// Build a validated check result.
    ///
    /// Fails with [`CoreError::Validation`] if the host or service name is
    /// empty or contains `;` or a line break, or if the message contains a
    /// line break.
    pub fn new(
        timestamp: UnixSeconds,
        hostname: impl Into<String>,
        service: impl Into<String>,
        status: Status,
        message: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let hostname = hostname.into();
        let service = service.into();
        let message = message.into();

        if !is_safe_name(&hostname) {
            return Err(CoreError::Validation(format!(
                "invalid host name '{hostname}'"
            )));
        }
        if !is_safe_name(&service) {
            return Err(CoreError::Validation(format!(
                "invalid service name '{service}'"
            )));
        }
        if message.contains(['\n', '\r']) {
            return Err(CoreError::Validation(
                "check message must be a single line".to_string(),
            ));
        }

        Ok(Self {
            timestamp,
            hostname,
            service,
            status,
            message,
        })
    }

    pub fn timestamp(&self) -> UnixSeconds {
        self.timestamp
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Wire form of this result, newline included.
    pub fn to_line(&self) -> Vec<u8> {
        message::build_line(
            self.timestamp,
            &self.hostname,
            &self.service,
            self.status,
            &self.message,
        )
    }
}
