use axum::extract::State;
use std::sync::Arc;
use std::time::Duration;

use crate::AppState;

// ─── Simulated work bounds ───────────────────────────────────────

pub const FOO_MIN: Duration = Duration::from_millis(25);
pub const FOO_MAX: Duration = Duration::from_millis(175);
pub const BAR_MIN: Duration = Duration::from_millis(50);
pub const BAR_MAX: Duration = Duration::from_millis(250);

// ─── /api/foo ────────────────────────────────────────────────────

pub async fn foo(State(state): State<Arc<AppState>>) -> &'static str {
    tracing::info!("Handling foo...");
    let work = state.simulation.pick_duration(FOO_MIN, FOO_MAX);
    tokio::time::sleep(work).await;

    "Handled foo"
}

// ─── /api/bar ────────────────────────────────────────────────────

pub async fn bar(State(state): State<Arc<AppState>>) -> &'static str {
    tracing::info!("Handling bar...");
    let work = state.simulation.pick_duration(BAR_MIN, BAR_MAX);
    tokio::time::sleep(work).await;

    "Handled bar"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::testing::ScriptedSimulation;
    use crate::simulation::RandomSimulation;
    use crate::test_support::state_with;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn foo_latency_stays_in_range() {
        let state = state_with(RandomSimulation::with_seed(1));

        for _ in 0..200 {
            let t0 = Instant::now();
            let body = foo(State(state.clone())).await;
            let elapsed = t0.elapsed();

            assert_eq!(body, "Handled foo");
            assert!(elapsed >= FOO_MIN && elapsed < FOO_MAX, "{elapsed:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bar_latency_stays_in_range() {
        let state = state_with(RandomSimulation::with_seed(2));

        for _ in 0..200 {
            let t0 = Instant::now();
            let body = bar(State(state.clone())).await;
            let elapsed = t0.elapsed();

            assert_eq!(body, "Handled bar");
            assert!(elapsed >= BAR_MIN && elapsed < BAR_MAX, "{elapsed:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn handlers_sleep_for_the_simulated_duration() {
        let state = state_with(ScriptedSimulation::fixed(Duration::from_millis(80)));

        let t0 = Instant::now();
        foo(State(state.clone())).await;
        assert_eq!(t0.elapsed(), Duration::from_millis(80));
    }
}
