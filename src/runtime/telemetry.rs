use crate::registry::RunOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default interval used by the metrics reporter task.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Lightweight rolling counters over sweep run outcomes.
#[derive(Default, Debug)]
pub struct Telemetry {
    dispatched: AtomicU64,
    successes: AtomicU64,
    timeouts: AtomicU64,
    failures: AtomicU64,
    missing_inputs: AtomicU64,
}

impl Telemetry {
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::Success { .. } => {
                self.successes.fetch_add(1, Ordering::Relaxed);
            }
            RunOutcome::Timeout => {
                self.timeouts.fetch_add(1, Ordering::Relaxed);
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
            RunOutcome::NonZeroExit { .. } | RunOutcome::MalformedOutput { .. } => {
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
            RunOutcome::MissingInput => {
                self.missing_inputs.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            missing_inputs: self.missing_inputs.load(Ordering::Relaxed),
        }
    }

    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn missing_inputs(&self) -> u64 {
        self.missing_inputs.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TelemetrySnapshot {
    pub dispatched: u64,
    pub successes: u64,
    pub timeouts: u64,
    pub failures: u64,
    pub missing_inputs: u64,
}

/// Spawns a background task that periodically logs sweep throughput and
/// outcome counters until the shutdown token is cancelled.
pub fn spawn_metrics_reporter(
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_snapshot = telemetry.snapshot();
        let mut last_tick = Instant::now();

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(target: "misp_bench::metrics", "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let current = telemetry.snapshot();
                    let completed_delta = current
                        .successes
                        .saturating_sub(last_snapshot.successes);
                    let elapsed = last_tick.elapsed().as_secs_f64();
                    let throughput = if elapsed <= f64::EPSILON {
                        0.0
                    } else {
                        completed_delta as f64 / elapsed
                    };

                    tracing::info!(
                        target: "misp_bench::metrics",
                        throughput = format!("{throughput:.2}"),
                        dispatched = current.dispatched,
                        successes = current.successes,
                        timeouts = current.timeouts,
                        failures = current.failures,
                        missing_inputs = current.missing_inputs,
                        "sweep metrics snapshot"
                    );

                    last_snapshot = current;
                    last_tick = Instant::now();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[test]
    fn telemetry_records_outcome_counters() {
        let telemetry = Telemetry::default();
        telemetry.record_dispatched();
        telemetry.record_dispatched();
        telemetry.record_outcome(&RunOutcome::Success {
            value: 10,
            elapsed_ms: None,
        });
        telemetry.record_outcome(&RunOutcome::Timeout);
        telemetry.record_outcome(&RunOutcome::MissingInput);
        telemetry.record_outcome(&RunOutcome::MalformedOutput {
            detail: "empty stdout".into(),
        });

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.dispatched, 2);
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.failures, 2);
        assert_eq!(snapshot.missing_inputs, 1);
    }

    #[tokio::test]
    async fn metrics_reporter_stops_on_shutdown() {
        let telemetry = Arc::new(Telemetry::default());
        let shutdown = CancellationToken::new();
        let handle = spawn_metrics_reporter(
            telemetry,
            shutdown.clone(),
            Duration::from_millis(10),
        );

        shutdown.cancel();
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("reporter should stop promptly")
            .expect("task should not panic");
    }
}
