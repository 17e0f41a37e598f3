/*
[INPUT]:  Consecutive reconnect attempt count
[OUTPUT]: Delay before the next connection attempt
[POS]:    Transport layer - reconnect backoff policy
[UPDATE]: When changing backoff shape, caps or jitter
*/

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with jitter; the first retry after a close is immediate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub jitter: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: Duration::from_millis(250),
        }
    }
}

impl ReconnectPolicy {
    /// Reconnect right away, every time
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Delay before reconnect number `attempt` (0-based, reset once a connection opens)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.initial_delay.is_zero() {
            return Duration::ZERO;
        }

        let exp = (attempt - 1).min(16);
        let base = self.initial_delay.saturating_mul(1u32 << exp);
        let jitter = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let max_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
            Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
        };

        base.saturating_add(jitter).min(self.max_delay)
    }
}
