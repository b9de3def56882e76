//! Randomness and suspension used by the pipeline.
//!
//! Both are injected so tests can run with a fixed seed and without waiting.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default lower bound of the inter-send delay.
pub const DEFAULT_PACING_MIN: Duration = Duration::from_secs(10);
/// Default upper bound of the inter-send delay.
pub const DEFAULT_PACING_MAX: Duration = Duration::from_secs(20);

/// Suspends the current task.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Sleeps for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Random source selection and inter-send delays.
pub struct Pacer {
    rng: Mutex<StdRng>,
    sleeper: Arc<dyn Sleeper>,
    min: Duration,
    max: Duration,
}

impl Pacer {
    /// Production pacer: entropy-seeded, tokio sleeps.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self::with_parts(StdRng::from_entropy(), Arc::new(TokioSleeper), min, max)
    }

    /// Pacer with an explicit random source and sleeper.
    ///
    /// Bounds given in the wrong order are swapped.
    #[must_use]
    pub fn with_parts(rng: StdRng, sleeper: Arc<dyn Sleeper>, min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            rng: Mutex::new(rng),
            sleeper,
            min,
            max,
        }
    }

    /// Picks one element uniformly at random.
    pub fn pick<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.with_rng(|rng| rng.gen_range(0..items.len()));
        items.get(index)
    }

    /// Draws a delay uniformly from `[min, max]`.
    pub fn next_delay(&self) -> Duration {
        let (min, max) = (self.min, self.max);
        self.with_rng(|rng| rng.gen_range(min..=max))
    }

    /// Sleeps for a freshly drawn delay and returns it.
    pub async fn pause(&self) -> Duration {
        let delay = self.next_delay();
        self.sleeper.sleep(delay).await;
        delay
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        // Poisoning leaves the RNG state intact.
        let mut guard = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("min", &self.min)
            .field("max", &self.max)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSleeper;

    #[test]
    fn test_delay_within_bounds() {
        let pacer = Pacer::with_parts(
            StdRng::seed_from_u64(7),
            Arc::new(RecordingSleeper::default()),
            DEFAULT_PACING_MIN,
            DEFAULT_PACING_MAX,
        );
        for _ in 0..200 {
            let delay = pacer.next_delay();
            assert!(delay >= DEFAULT_PACING_MIN && delay <= DEFAULT_PACING_MAX);
        }
    }

    #[test]
    fn test_pick_covers_every_element() {
        let pacer = Pacer::with_parts(
            StdRng::seed_from_u64(1),
            Arc::new(RecordingSleeper::default()),
            Duration::ZERO,
            Duration::ZERO,
        );
        let handles = ["a", "b", "c"];
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            if let Some(h) = pacer.pick(&handles) {
                seen.insert(*h);
            }
        }
        assert_eq!(seen.len(), 3);
        assert!(pacer.pick::<&str>(&[]).is_none());
    }

    #[tokio::test]
    async fn test_pause_uses_injected_sleeper() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let pacer = Pacer::with_parts(
            StdRng::seed_from_u64(3),
            sleeper.clone(),
            Duration::from_secs(20),
            Duration::from_secs(10),
        );
        let delay = pacer.pause().await;
        assert_eq!(sleeper.recorded(), vec![delay]);
        assert!(delay >= Duration::from_secs(10) && delay <= Duration::from_secs(20));
    }
}
