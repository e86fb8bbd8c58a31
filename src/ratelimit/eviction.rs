//! Sweep cadence for expired client windows.
//!
//! Sweeping only bounds memory. Lookups already treat expired windows as
//! absent, so every strategy here gives the same admission decisions.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{EvictionConfig, EvictionMode};

/// Decides whether an admission call should sweep before deciding.
pub trait EvictionStrategy: Send + Sync {
    fn should_sweep(&self, now_ms: u64) -> bool;
}

/// Sweep on a random fraction of calls.
///
/// The default draws from each thread's own generator, so concurrent
/// admissions never contend here. Seeded sweeps share one locked
/// generator to keep a run reproducible.
pub struct ProbabilisticSweep {
    probability: f64,
    source: RandomSource,
}

enum RandomSource {
    ThreadLocal,
    Seeded(Mutex<StdRng>),
}

impl ProbabilisticSweep {
    pub fn new(probability: f64) -> Self {
        Self::with_source(probability, RandomSource::ThreadLocal)
    }

    /// Create a sweep with a fixed seed, for reproducible runs.
    pub fn seeded(probability: f64, seed: u64) -> Self {
        Self::with_source(
            probability,
            RandomSource::Seeded(Mutex::new(StdRng::seed_from_u64(seed))),
        )
    }

    fn with_source(probability: f64, source: RandomSource) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self {
            probability,
            source,
        }
    }
}

impl Default for ProbabilisticSweep {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl EvictionStrategy for ProbabilisticSweep {
    fn should_sweep(&self, _now_ms: u64) -> bool {
        match &self.source {
            RandomSource::ThreadLocal => rand::thread_rng().gen_bool(self.probability),
            RandomSource::Seeded(rng) => rng.lock().gen_bool(self.probability),
        }
    }
}

/// Sweep inline at most once per interval.
pub struct IntervalSweep {
    every_ms: u64,
    next_sweep_ms: AtomicU64,
}

impl IntervalSweep {
    pub fn new(every_ms: u64) -> Self {
        Self {
            every_ms,
            next_sweep_ms: AtomicU64::new(0),
        }
    }
}

impl EvictionStrategy for IntervalSweep {
    fn should_sweep(&self, now_ms: u64) -> bool {
        let next = self.next_sweep_ms.load(Ordering::Acquire);
        if now_ms < next {
            return false;
        }
        // Only the caller that moves the deadline forward sweeps.
        self.next_sweep_ms
            .compare_exchange(
                next,
                now_ms.saturating_add(self.every_ms),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Never sweep inline. Pair with [`super::spawn_sweeper`].
#[derive(Debug, Default)]
pub struct NoInlineSweep;

impl EvictionStrategy for NoInlineSweep {
    fn should_sweep(&self, _now_ms: u64) -> bool {
        false
    }
}

/// Build the inline strategy for a configured eviction mode.
pub fn from_config(config: &EvictionConfig) -> Box<dyn EvictionStrategy> {
    match config.mode {
        EvictionMode::Probabilistic => Box::new(ProbabilisticSweep::new(config.probability)),
        EvictionMode::Interval => Box::new(IntervalSweep::new(config.interval_ms)),
        EvictionMode::Background => Box::new(NoInlineSweep),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probabilistic_extremes() {
        let always = ProbabilisticSweep::seeded(1.0, 7);
        let never = ProbabilisticSweep::seeded(0.0, 7);

        for now in 0..100 {
            assert!(always.should_sweep(now));
            assert!(!never.should_sweep(now));
        }
    }

    #[test]
    fn test_unseeded_sweep_across_threads() {
        let always = ProbabilisticSweep::new(1.0);
        let never = ProbabilisticSweep::new(0.0);
        let sometimes = ProbabilisticSweep::default();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let mut hits = 0;
                    for now in 0..1_000 {
                        assert!(always.should_sweep(now));
                        assert!(!never.should_sweep(now));
                        if sometimes.should_sweep(now) {
                            hits += 1;
                        }
                    }
                    assert!((20..300).contains(&hits), "hits = {}", hits);
                });
            }
        });
    }

    #[test]
    fn test_probabilistic_rate_is_roughly_probability() {
        let sweep = ProbabilisticSweep::seeded(0.1, 42);
        let hits = (0..10_000).filter(|&n| sweep.should_sweep(n)).count();

        assert!((700..1300).contains(&hits), "hits = {}", hits);
    }

    #[test]
    fn test_probabilistic_clamps_out_of_range() {
        assert!(ProbabilisticSweep::seeded(4.0, 1).should_sweep(0));
        assert!(!ProbabilisticSweep::seeded(-1.0, 1).should_sweep(0));
        assert!(!ProbabilisticSweep::seeded(f64::NAN, 1).should_sweep(0));
    }

    #[test]
    fn test_interval_sweeps_once_per_period() {
        let sweep = IntervalSweep::new(1_000);

        assert!(sweep.should_sweep(5_000));
        assert!(!sweep.should_sweep(5_001));
        assert!(!sweep.should_sweep(5_999));
        assert!(sweep.should_sweep(6_000));
        assert!(!sweep.should_sweep(6_500));
    }

    #[test]
    fn test_no_inline_sweep() {
        assert!(!NoInlineSweep.should_sweep(u64::MAX));
    }

    #[test]
    fn test_from_config_background_never_sweeps_inline() {
        let config = EvictionConfig {
            mode: EvictionMode::Background,
            ..EvictionConfig::default()
        };
        assert!(!from_config(&config).should_sweep(1_000));
    }
}
