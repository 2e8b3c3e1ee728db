//! Minimum-spacing rate limiter.
//!
//! Grants at most one turn per `60 / requests_per_minute` seconds. There is
//! no token accumulation: a quiet period does not allow a later burst.

use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Spacing enforcer for outbound calls.
///
/// Holds the time of the last granted turn. It takes `&mut self`, so
/// sharing it across tasks needs an explicit lock around it.
#[derive(Debug)]
pub struct RateLimiter {
    spacing: Duration,
    last_turn: Option<Instant>,
}

impl RateLimiter {
    /// `requests_per_minute` below 1 is treated as 1.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1);
        Self::with_spacing(Duration::from_secs_f64(60.0 / f64::from(rpm)))
    }

    pub fn with_spacing(spacing: Duration) -> Self {
        Self {
            spacing,
            last_turn: None,
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Wait until at least `spacing` has passed since the last turn.
    pub async fn wait_turn(&mut self) {
        if let Some(last) = self.last_turn {
            let elapsed = last.elapsed();
            if elapsed < self.spacing {
                let remaining = self.spacing - elapsed;
                log::trace!("rate limit: waiting {:?}", remaining);
                sleep(remaining).await;
            }
        }
        self.last_turn = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_from_rpm() {
        assert_eq!(RateLimiter::per_minute(60).spacing(), Duration::from_secs(1));
        assert_eq!(RateLimiter::per_minute(120).spacing(), Duration::from_millis(500));
        assert_eq!(RateLimiter::per_minute(0).spacing(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_first_turn_is_immediate() {
        let mut limiter = RateLimiter::per_minute(1);
        let start = std::time::Instant::now();
        limiter.wait_turn().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_back_to_back_turns_are_spaced() {
        let mut limiter = RateLimiter::per_minute(60);
        limiter.wait_turn().await;
        let first = std::time::Instant::now();
        limiter.wait_turn().await;
        assert!(first.elapsed() >= Duration::from_millis(990));
    }

    #[tokio::test]
    async fn test_no_burst_after_idle() {
        let mut limiter = RateLimiter::with_spacing(Duration::from_millis(50));
        limiter.wait_turn().await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        limiter.wait_turn().await;
        let granted = std::time::Instant::now();
        limiter.wait_turn().await;
        assert!(granted.elapsed() >= Duration::from_millis(45));
    }
}
