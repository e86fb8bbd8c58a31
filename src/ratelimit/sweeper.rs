//! Background sweeping of expired client windows.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::clock::Clock;
use super::limiter::RateLimiter;

/// Shortest period the sweeper will tick at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Spawn a task that sweeps `limiter` every `period` until aborted.
///
/// Periods below one millisecond, zero included, are raised to one.
pub fn spawn_sweeper(
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    period: Duration,
) -> JoinHandle<()> {
    let period = period.max(MIN_PERIOD);
    info!(period_ms = period.as_millis() as u64, "Starting background sweeper");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = limiter.sweep(clock.now_ms());
            debug!(
                removed = removed,
                tracked = limiter.tracked_clients(),
                "Background sweep finished"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::clock::ManualClock;
    use crate::ratelimit::eviction::NoInlineSweep;
    use crate::ratelimit::policy::RateLimitPolicy;

    #[tokio::test]
    async fn test_sweeper_removes_expired_windows() {
        let limiter = Arc::new(RateLimiter::with_eviction(
            RateLimitPolicy::new(1_000, 10),
            Box::new(NoInlineSweep),
        ));
        let clock = Arc::new(ManualClock::new(0));

        limiter.admit("a", 0);
        limiter.admit("b", 0);
        assert_eq!(limiter.tracked_clients(), 2);

        clock.set(5_000);
        let handle = spawn_sweeper(limiter.clone(), clock.clone(), Duration::from_millis(10));

        for _ in 0..100 {
            if limiter.tracked_clients() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[tokio::test]
    async fn test_sweeper_zero_period_is_clamped() {
        let limiter = Arc::new(RateLimiter::with_eviction(
            RateLimitPolicy::new(1_000, 10),
            Box::new(NoInlineSweep),
        ));
        let clock = Arc::new(ManualClock::new(0));
        limiter.admit("a", 0);

        clock.set(5_000);
        let handle = spawn_sweeper(limiter.clone(), clock.clone(), Duration::ZERO);

        for _ in 0..100 {
            if limiter.tracked_clients() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(!handle.is_finished(), "sweeper task exited");
        handle.abort();
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
