//! Per-domain rate limiting state.

use std::time::{Duration, Instant};

/// State for a single domain.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Current delay for this domain.
    pub current_delay: Duration,
    /// Last request time.
    pub last_request: Option<Instant>,
    /// Consecutive successes since last rate limit.
    pub consecutive_successes: u32,
    /// Whether currently in backoff.
    pub in_backoff: bool,
    pub total_requests: u64,
    pub rate_limit_hits: u64,
}

impl DomainState {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            current_delay: base_delay,
            last_request: None,
            consecutive_successes: 0,
            in_backoff: false,
            total_requests: 0,
            rate_limit_hits: 0,
        }
    }

    /// Time until this domain is ready for another request.
    pub fn time_until_ready(&self) -> Duration {
        match self.last_request {
            // `last` may lie in the future when a slot was reserved ahead.
            Some(last) => (last + self.current_delay).saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    /// Multiply the current delay, capped at `max`.
    pub fn scale_delay(&mut self, factor: f64, max: Duration) {
        let scaled = Duration::from_secs_f64(self.current_delay.as_secs_f64() * factor);
        self.current_delay = scaled.min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_without_history() {
        let state = DomainState::new(Duration::from_secs(5));
        assert_eq!(state.time_until_ready(), Duration::ZERO);
    }

    #[test]
    fn test_scale_delay_capped() {
        let mut state = DomainState::new(Duration::from_secs(10));
        state.scale_delay(4.0, Duration::from_secs(30));
        assert_eq!(state.current_delay, Duration::from_secs(30));
    }
}
