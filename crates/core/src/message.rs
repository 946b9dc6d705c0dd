//! Formatting of `PROCESS_SERVICE_CHECK_RESULT` command lines.
//!
//! An NSCA-ng `PUSH` payload is nothing more than these lines glued
//! together, each terminated by `;\n`.

use crate::check_result::CheckResult;
use crate::status::Status;
use crate::types::UnixSeconds;

/// External command name understood by the monitoring core.
pub const COMMAND: &str = "PROCESS_SERVICE_CHECK_RESULT";

/// Format one check-result line.
///
/// ```text
/// [<ts>] PROCESS_SERVICE_CHECK_RESULT;<host>;<service>;<ordinal>;<message>;\n
/// ```
///
/// The trailing `;` is required by the server's parser.
pub fn build_line(
    ts: UnixSeconds,
    hostname: &str,
    service: &str,
    status: Status,
    message: &str,
) -> Vec<u8> {
    format!(
        "[{ts}] {COMMAND};{hostname};{service};{};{message};\n",
        status.ordinal()
    )
    .into_bytes()
}

/// Concatenate the lines of `results` in order, without extra separators.
pub fn build_batch(results: &[CheckResult]) -> Vec<u8> {
    results.iter().flat_map(CheckResult::to_line).collect()
}
