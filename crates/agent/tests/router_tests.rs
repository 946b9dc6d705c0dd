//! Routing tests: metrics in, exactly one PUSH out.

mod common;

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use nsca_agent::error::AgentError;
use nsca_agent::router::MetricRouter;
use nsca_agent::session::{NscaSession, SessionOptions};
use nsca_core::checks::{ThresholdConfig, Thresholds};
use nsca_core::metric::Metric;

use common::{lock, reset, written_text, MemoryTransport, Recorded};

const EXPECTED_LINE: &str =
    "[1714564800] PROCESS_SERVICE_CHECK_RESULT;h;CPU Load;0;load average: 1.620000,1.510000,1.510000;\n";

fn router() -> MetricRouter {
    MetricRouter::new(Thresholds::from([
        ("system".to_string(), ThresholdConfig::new(3.6, 4.0).unwrap()),
        ("mem".to_string(), ThresholdConfig::new(85.0, 95.0).unwrap()),
    ]))
}

/// A connected session with the handshake already cleared from the record.
fn connected() -> (NscaSession<MemoryTransport>, Arc<Mutex<Recorded>>) {
    let (transport, recorded) = MemoryTransport::new();
    let mut session = NscaSession::new(SessionOptions::default());
    session.attach(transport).unwrap();
    reset(&recorded);
    (session, recorded)
}

fn sample_metrics() -> Vec<Metric> {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    vec![
        Metric::now("system")
            .with_timestamp(at)
            .with_tag("host", "h")
            .with_field("load1", 1.62)
            .with_field("load5", 1.51)
            .with_field("load15", 1.51),
        Metric::now("net")
            .with_timestamp(at)
            .with_tag("host", "h")
            .with_tag("interface", "eth0")
            .with_field("bytes_recv", 1024_i64),
    ]
}

// ---------------------------------------------------------------------------
// Test: mixed batch is pushed once
// ---------------------------------------------------------------------------

#[test]
fn route_pushes_recognised_metrics_once() {
    let (mut session, recorded) = connected();

    let payload = router().route(&sample_metrics(), &mut session).unwrap();

    assert_eq!(payload, EXPECTED_LINE.as_bytes());
    assert_eq!(
        written_text(&recorded),
        format!("PUSH {}\n{EXPECTED_LINE}", EXPECTED_LINE.len())
    );
    assert_eq!(lock(&recorded).write_calls, 2);
}

#[test]
fn batch_matches_routed_payload() {
    let (mut session, _) = connected();
    let router = router();

    let batch = router.batch(&sample_metrics());
    let routed = router.route(&sample_metrics(), &mut session).unwrap();

    assert_eq!(batch, routed);
}

#[test]
fn metrics_without_thresholds_are_skipped() {
    let (mut session, recorded) = connected();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let disk = Metric::now("disk")
        .with_timestamp(at)
        .with_tag("host", "h")
        .with_tag("path", "/")
        .with_field("used_percent", 99.0);

    router().route(&[disk], &mut session).unwrap();

    assert_eq!(written_text(&recorded), "PUSH 0\n");
}

// ---------------------------------------------------------------------------
// Test: nothing to report still produces one PUSH
// ---------------------------------------------------------------------------

#[test]
fn empty_input_pushes_empty_batch() {
    let (mut session, recorded) = connected();

    let payload = router().route(&[], &mut session).unwrap();

    assert!(payload.is_empty());
    assert_eq!(written_text(&recorded), "PUSH 0\n");
}

// ---------------------------------------------------------------------------
// Test: session errors surface unchanged
// ---------------------------------------------------------------------------

#[test]
fn route_on_closed_session_fails() {
    let (mut session, recorded) = connected();
    session.close();

    let err = router().route(&sample_metrics(), &mut session).unwrap_err();

    assert_matches!(err, AgentError::Io(_));
    assert!(lock(&recorded).written.is_empty());
}

#[test]
fn route_surfaces_write_failures() {
    let (transport, _) = MemoryTransport::new();
    let mut session = NscaSession::new(SessionOptions::default());
    session.attach(transport.limit_writes(20)).unwrap();

    let err = router().route(&sample_metrics(), &mut session).unwrap_err();

    assert_matches!(err, AgentError::Io(_));
}
