use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::metrics::BackgroundTaskMetrics;
use crate::simulation::Simulation;

// ─── Configuration ───────────────────────────────────────────────

/// Time between the starts of consecutive iterations.
pub const PERIOD: Duration = Duration::from_secs(5);

/// Bounds of the simulated work done by one iteration.
pub const WORK_MIN: Duration = Duration::from_millis(1000);
pub const WORK_MAX: Duration = Duration::from_millis(1500);

/// An iteration succeeds iff its roll is strictly above this.
pub const FAILURE_THRESHOLD: f64 = 0.3;

// ─── Public types ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    fn from_roll(roll: f64) -> Self {
        if roll > FAILURE_THRESHOLD {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

// ─── Loop ────────────────────────────────────────────────────────

/// Runs iterations every `PERIOD` until `cancel` fires.
///
/// Cancellation is only observed between iterations, so an iteration that has
/// started always records its metrics.
pub async fn run(
    metrics: BackgroundTaskMetrics,
    simulation: Arc<dyn Simulation>,
    cancel: CancellationToken,
) {
    tracing::info!("Starting background task loop...");

    let mut ticker = time::interval_at(Instant::now() + PERIOD, PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        run_once(&metrics, simulation.as_ref()).await;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Background task loop stopped");
                return;
            }
            _ = ticker.tick() => {}
        }
    }
}

/// One iteration: simulate work, then record its outcome.
pub async fn run_once(metrics: &BackgroundTaskMetrics, simulation: &dyn Simulation) -> Outcome {
    tracing::info!("Performing background task...");
    time::sleep(simulation.pick_duration(WORK_MIN, WORK_MAX)).await;

    // Both gauges get this exact value on success, so `last_run ==
    // last_success` identifies a successful last run.
    let timestamp = unix_seconds();

    let outcome = Outcome::from_roll(simulation.roll());
    match outcome {
        Outcome::Success => {
            tracing::info!("Background task completed successfully.");
            metrics.last_success.set(timestamp);
        }
        Outcome::Failure => {
            metrics.failures.inc();
            tracing::warn!("Background task failed.");
        }
    }
    metrics.runs.inc();
    metrics.last_run.set(timestamp);

    outcome
}

fn unix_seconds() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsCollector;
    use crate::simulation::testing::ScriptedSimulation;
    use crate::simulation::RandomSimulation;

    fn task_metrics() -> BackgroundTaskMetrics {
        BackgroundTaskMetrics::new(&MetricsCollector::new()).unwrap()
    }

    #[test]
    fn roll_must_exceed_threshold_to_succeed() {
        assert_eq!(Outcome::from_roll(0.0), Outcome::Failure);
        assert_eq!(Outcome::from_roll(0.3), Outcome::Failure);
        assert_eq!(Outcome::from_roll(0.3001), Outcome::Success);
        assert_eq!(Outcome::from_roll(0.99), Outcome::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn success_sets_both_gauges_to_the_same_timestamp() {
        let metrics = task_metrics();
        let sim = ScriptedSimulation::fastest().with_rolls([0.9]);

        let outcome = run_once(&metrics, &sim).await;

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(metrics.runs.get(), 1);
        assert_eq!(metrics.failures.get(), 0);
        assert!(metrics.last_run.get() > 0.0);
        assert_eq!(
            metrics.last_run.get().to_bits(),
            metrics.last_success.get().to_bits()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failure_leaves_last_success_untouched() {
        let metrics = task_metrics();
        let sim = ScriptedSimulation::fastest().with_rolls([0.9, 0.1]);

        run_once(&metrics, &sim).await;
        let last_success = metrics.last_success.get();
        let first_run = metrics.last_run.get();

        let outcome = run_once(&metrics, &sim).await;

        assert_eq!(outcome, Outcome::Failure);
        assert_eq!(metrics.runs.get(), 2);
        assert_eq!(metrics.failures.get(), 1);
        assert_eq!(metrics.last_success.get(), last_success);
        assert!(metrics.last_run.get() >= first_run);
        assert!(metrics.last_run.get() >= metrics.last_success.get());
    }

    #[tokio::test(start_paused = true)]
    async fn counters_track_every_iteration() {
        let metrics = task_metrics();
        let rolls = [0.5, 0.2, 0.8, 0.3, 0.0, 0.7];
        let sim = ScriptedSimulation::fastest().with_rolls(rolls);

        for _ in rolls {
            run_once(&metrics, &sim).await;
        }

        assert_eq!(metrics.runs.get(), 6);
        assert_eq!(metrics.failures.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gauges_are_stable_between_iterations() {
        let metrics = task_metrics();
        run_once(&metrics, &RandomSimulation::with_seed(3)).await;

        let first = (metrics.last_run.get(), metrics.last_success.get());
        let second = (metrics.last_run.get(), metrics.last_success.get());
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn work_takes_the_simulated_duration() {
        let metrics = task_metrics();
        let t0 = Instant::now();
        run_once(&metrics, &RandomSimulation::with_seed(4)).await;

        let elapsed = t0.elapsed();
        assert!(elapsed >= WORK_MIN && elapsed < WORK_MAX, "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn iterations_start_once_per_period() {
        let metrics = task_metrics();
        let sim = Arc::new(ScriptedSimulation::fixed(Duration::from_secs(1)));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(metrics.clone(), sim, cancel.clone()));

        // Iterations finish at 1s, 6s and 11s.
        time::sleep(Duration::from_millis(11_500)).await;
        assert_eq!(metrics.runs.get(), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_waiting_stops_without_further_updates() {
        let metrics = task_metrics();
        let sim = Arc::new(ScriptedSimulation::fixed(Duration::from_secs(1)));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(metrics.clone(), sim, cancel.clone()));

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(metrics.runs.get(), 1);
        let last_run = metrics.last_run.get();

        let t0 = Instant::now();
        cancel.cancel();
        handle.await.unwrap();
        assert!(t0.elapsed() <= PERIOD);

        time::sleep(PERIOD * 3).await;
        assert_eq!(metrics.runs.get(), 1);
        assert_eq!(metrics.last_run.get(), last_run);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_work_finishes_the_iteration() {
        let metrics = task_metrics();
        let sim = Arc::new(ScriptedSimulation::fixed(Duration::from_secs(1)));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(metrics.clone(), sim, cancel.clone()));

        time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(metrics.runs.get(), 1);
    }
}
