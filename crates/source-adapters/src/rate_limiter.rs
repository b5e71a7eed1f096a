//! Sliding-window rate limiter: at most `max_requests` per `window`.
//! Shared by every adapter in this crate instead of each hand-rolling one.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Clone)]
pub struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    pub async fn acquire(&self) {
        loop {
            let mut timestamps = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = timestamps.front() {
                if now.duration_since(front) >= self.window {
                    timestamps.pop_front();
                } else {
                    break;
                }
            }

            if timestamps.len() < self.max_requests {
                timestamps.push_back(now);
                return;
            }

            let wait_until = timestamps.front().unwrap().checked_add(self.window).unwrap();
            let sleep_dur = wait_until.saturating_duration_since(now) + Duration::from_millis(25);
            drop(timestamps);
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_bursts_up_to_capacity() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.timestamps.lock().await.len(), 3);
    }
}
