/*
[INPUT]:  Wall clock time
[OUTPUT]: Strictly increasing microsecond nonces
[POS]:    Auth layer - replay protection for the auth handshake
[UPDATE]: When changing nonce resolution or source
*/

use chrono::Utc;

/// Produces microsecond nonces that never repeat or go backwards
#[derive(Debug, Default, Clone)]
pub struct NonceGenerator {
    last: u64,
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next nonce based on the current wall clock
    pub fn next(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or_default();
        self.next_at(now)
    }

    /// Next nonce given an explicit clock reading in microseconds
    pub fn next_at(&mut self, now_micros: u64) -> u64 {
        let nonce = now_micros.max(self.last.saturating_add(1));
        self.last = nonce;
        nonce
    }

    /// Last nonce handed out (0 before the first call)
    pub fn last(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follows_clock() {
        let mut nonces = NonceGenerator::new();
        assert_eq!(nonces.next_at(1_600_000_000_000_000), 1_600_000_000_000_000);
        assert_eq!(nonces.next_at(1_600_000_000_000_500), 1_600_000_000_000_500);
    }

    #[test]
    fn test_strictly_increasing_when_clock_stalls_or_rewinds() {
        let mut nonces = NonceGenerator::new();
        let first = nonces.next_at(1_000);
        let second = nonces.next_at(1_000);
        let third = nonces.next_at(900);
        assert!(first < second);
        assert!(second < third);
        assert_eq!(nonces.last(), third);
    }

    #[test]
    fn test_wall_clock_is_microseconds() {
        let mut nonces = NonceGenerator::new();
        let a = nonces.next();
        let b = nonces.next();
        assert!(b > a);
        // 2020-09-13 in microseconds
        assert!(a > 1_600_000_000_000_000);
    }
}
