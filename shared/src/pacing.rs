use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tokio::time::sleep;

use crate::cancel::CancelFlag;
use crate::error::Error;

/// Spaces successive requests against one endpoint by a minimum interval.
/// The first call passes immediately; later calls wait out whatever is
/// left of the interval. A zero interval disables pacing entirely.
pub struct Pacer {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            limiter: Quota::with_period(interval).map(RateLimiter::direct),
        }
    }

    /// Waits until the next request may go out, honoring cancellation
    /// while suspended.
    pub async fn ready(&self, cancel: &CancelFlag) -> Result<(), Error> {
        if cancel.is_cancelled() {
            return Err(Error::Interrupted);
        }
        if let Some(limiter) = &self.limiter {
            tokio::select! {
                _ = limiter.until_ready() => {}
                _ = cancel.cancelled() => return Err(Error::Interrupted),
            }
        }
        Ok(())
    }
}

/// One-off politeness pause between bursts of report runs, independent of
/// any per-endpoint pacer. Honors cancellation while suspended.
pub async fn pause(interval: Duration, cancel: &CancelFlag) -> Result<(), Error> {
    if cancel.is_cancelled() {
        return Err(Error::Interrupted);
    }
    if interval.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = sleep(interval) => Ok(()),
        _ = cancel.cancelled() => Err(Error::Interrupted),
    }
}
