use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::time::Duration;

/// Source of the randomness standing in for real work.
///
/// Handlers and the background task draw their simulated work durations and
/// outcomes from here, so tests can swap in a deterministic implementation.
pub trait Simulation: Send + Sync {
    /// Whole-millisecond duration drawn uniformly from `[min, max)`.
    fn pick_duration(&self, min: Duration, max: Duration) -> Duration;

    /// Value drawn uniformly from `[0, 1)`.
    fn roll(&self) -> f64;
}

/// `Simulation` backed by a seeded `StdRng`.
pub struct RandomSimulation {
    rng: Mutex<StdRng>,
}

impl RandomSimulation {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomSimulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation for RandomSimulation {
    fn pick_duration(&self, min: Duration, max: Duration) -> Duration {
        let (lo, hi) = (min.as_millis() as u64, max.as_millis() as u64);
        if hi <= lo {
            return min;
        }
        Duration::from_millis(self.rng.lock().gen_range(lo..hi))
    }

    fn roll(&self) -> f64 {
        self.rng.lock().gen()
    }
}
