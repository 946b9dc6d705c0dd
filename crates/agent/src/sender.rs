//! Periodic collect-and-push loop.
//!
//! On every tick the agent collects host metrics, opens an NSCA-ng session,
//! routes the metrics over it and closes it again, so no connection sits
//! idle between pushes. Sessions are blocking, so each cycle runs on the
//! blocking thread pool with the collector moved in and back out; only one
//! cycle is ever in flight.
//!
//! A failed cycle loses its batch. The next tick starts over with a fresh
//! session; there is no backoff beyond the tick interval.

use nsca_core::metric::Metric;
use tokio::task::JoinError;

use crate::collector::MetricsCollector;
use crate::config::AgentConfig;
use crate::error::AgentResult;
use crate::router::MetricRouter;
use crate::session::NscaSession;
use crate::transport::Transport;

type CycleOutcome = (MetricsCollector, AgentResult<usize>);

/// Run the push loop until `shutdown` resolves.
pub async fn run<F>(config: AgentConfig, collector: MetricsCollector, shutdown: F)
where
    F: std::future::Future<Output = ()>,
{
    let router = MetricRouter::new(config.thresholds.clone());
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut collector = collector;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                let config_for_cycle = config.clone();
                let router = router.clone();
                let mut owned_collector = collector;

                let outcome = tokio::task::spawn_blocking(move || {
                    let result = run_cycle(&config_for_cycle, &router, &mut owned_collector);
                    (owned_collector, result)
                })
                .await;

                collector = finish_cycle(config.hostname.as_deref(), outcome);
            }
        }
    }
}

/// Log the outcome of one cycle and hand back the collector for the next.
///
/// A panicked cycle takes its collector down with it; a fresh one is built
/// so the loop keeps running.
fn finish_cycle(
    hostname: Option<&str>,
    outcome: Result<CycleOutcome, JoinError>,
) -> MetricsCollector {
    match outcome {
        Ok((collector, Ok(bytes))) => {
            tracing::info!(bytes, "Check results submitted");
            collector
        }
        Ok((collector, Err(e))) => {
            tracing::warn!(error = %e, "Submission cycle failed");
            collector
        }
        Err(e) => {
            tracing::error!(error = %e, "Submission cycle panicked, rebuilding collector");
            MetricsCollector::new(hostname.map(str::to_string))
        }
    }
}

/// One blocking collect + connect + route + close cycle.
fn run_cycle(
    config: &AgentConfig,
    router: &MetricRouter,
    collector: &mut MetricsCollector,
) -> AgentResult<usize> {
    let metrics = collector.collect();
    submit(router, &metrics, || {
        let mut session: NscaSession = NscaSession::new(config.session.clone());
        session.connect(&config.server, &config.credentials)?;
        Ok(session)
    })
}

/// Open a session with `connect`, route `metrics` over it and close it.
///
/// The session is closed whether or not the push succeeded. Returns the
/// number of payload bytes pushed.
pub fn submit<T, C>(router: &MetricRouter, metrics: &[Metric], connect: C) -> AgentResult<usize>
where
    T: Transport,
    C: FnOnce() -> AgentResult<NscaSession<T>>,
{
    let mut session = connect()?;
    let result = router.route(metrics, &mut session);
    session.close();
    result.map(|payload| payload.len())
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read, Write};
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;
    use nsca_core::checks::{ThresholdConfig, Thresholds};

    use super::*;
    use crate::error::AgentError;
    use crate::session::SessionOptions;

    #[derive(Default)]
    struct Wire {
        written: Vec<u8>,
        disconnects: usize,
    }

    struct WireTransport(Arc<Mutex<Wire>>);

    impl Read for WireTransport {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for WireTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for WireTransport {
        fn disconnect(&mut self) -> io::Result<()> {
            self.0.lock().unwrap().disconnects += 1;
            Ok(())
        }
    }

    fn router() -> MetricRouter {
        MetricRouter::new(Thresholds::from([(
            "mem".to_string(),
            ThresholdConfig::new(85.0, 95.0).unwrap(),
        )]))
    }

    fn attached(wire: &Arc<Mutex<Wire>>) -> AgentResult<NscaSession<WireTransport>> {
        let mut session = NscaSession::new(SessionOptions::default());
        session.attach(WireTransport(Arc::clone(wire)))?;
        Ok(session)
    }

    #[test]
    fn submit_closes_the_session_after_pushing() {
        let wire = Arc::new(Mutex::new(Wire::default()));
        let mem = Metric::now("mem")
            .with_tag("host", "h")
            .with_field("used_percent", 50.0);

        let bytes = submit(&router(), &[mem], || attached(&wire)).unwrap();

        let wire = wire.lock().unwrap();
        let text = String::from_utf8_lossy(&wire.written);
        assert!(text.starts_with("MOIN 1 "));
        assert!(text.contains(&format!("PUSH {bytes}\n")));
        assert!(text.ends_with("Memory : OK - 50.00% used;\n"));
        assert_eq!(wire.disconnects, 1);
    }

    #[test]
    fn each_submit_uses_its_own_session() {
        let wire = Arc::new(Mutex::new(Wire::default()));

        submit(&router(), &[], || attached(&wire)).unwrap();
        submit(&router(), &[], || attached(&wire)).unwrap();

        let wire = wire.lock().unwrap();
        let text = String::from_utf8_lossy(&wire.written);
        assert_eq!(text.matches("MOIN 1 ").count(), 2);
        assert_eq!(wire.disconnects, 2);
    }

    #[test]
    fn connect_failure_skips_the_push() {
        let result = submit::<WireTransport, _>(&router(), &[], || {
            Err(AgentError::Connection("refused".into()))
        });
        assert_matches!(result, Err(AgentError::Connection(_)));
    }

    #[tokio::test]
    async fn panicked_cycle_yields_a_fresh_collector() {
        let outcome = tokio::task::spawn_blocking(|| -> CycleOutcome {
            panic!("collector blew up");
        })
        .await;
        assert!(outcome.is_err());

        let collector = finish_cycle(Some("h"), outcome);

        assert_eq!(collector.hostname(), "h");
    }

    #[test]
    fn failed_cycle_keeps_its_collector() {
        let collector = MetricsCollector::new(Some("kept".to_string()));
        let outcome = Ok((collector, Err(AgentError::Connection("refused".into()))));

        assert_eq!(finish_cycle(Some("other"), outcome).hostname(), "kept");
    }
}
