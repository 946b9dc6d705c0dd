//! Domain logic for NSCA-ng passive checks.
//!
//! Everything in this crate is pure: threshold classification, check-result
//! formatting and metric evaluation. The session transport lives in
//! `nsca-agent`.

pub mod check_result;
pub mod checks;
pub mod error;
pub mod message;
pub mod metric;
pub mod metric_names;
pub mod status;
pub mod threshold_validation;
pub mod types;
