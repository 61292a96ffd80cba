use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

// ── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    pub remaining: u32,
}

// ── Limiter ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Table {
    clients: HashMap<String, Vec<Instant>>,
    last_sweep: Instant,
}

/// Sliding-window request limiter, one timestamp log per client key.
///
/// State lives for the process lifetime. Stale client keys are evicted
/// lazily: at most once per window length a full sweep drops every key
/// whose timestamps have all aged out, so the table stays bounded by the
/// set of clients active within the last window.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    table: Mutex<Table>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            table: Mutex::new(Table {
                clients: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Admit or deny one request for `client_key`, counting it if admitted.
    pub async fn admit(&self, client_key: &str) -> Admission {
        self.admit_at(client_key, Instant::now()).await
    }

    /// Same as [`admit`](Self::admit) with an explicit clock reading.
    pub async fn admit_at(&self, client_key: &str, now: Instant) -> Admission {
        let mut table = self.table.lock().await;

        if now.duration_since(table.last_sweep) >= self.config.window {
            let window = self.config.window;
            table
                .clients
                .retain(|_, stamps| stamps.iter().any(|t| now.duration_since(*t) < window));
            table.last_sweep = now;
        }

        let window = self.config.window;
        let stamps = table.clients.entry(client_key.to_string()).or_default();
        stamps.retain(|t| now.duration_since(*t) < window);

        let count = stamps.len() as u32;
        if count >= self.config.max_requests {
            debug!(client = client_key, "rate limit exceeded");
            return Admission {
                allowed: false,
                remaining: 0,
            };
        }

        stamps.push(now);
        Admission {
            allowed: true,
            remaining: self.config.max_requests - (count + 1),
        }
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.table.lock().await.clients.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }

    #[tokio::test]
    async fn denies_past_the_cap_and_recovers_after_window() {
        let limiter = limiter(3, 60);
        let t0 = Instant::now();

        for i in 0..3 {
            let a = limiter.admit_at("10.0.0.1", t0).await;
            assert!(a.allowed);
            assert_eq!(a.remaining, 2 - i);
        }

        let denied = limiter.admit_at("10.0.0.1", t0 + Duration::from_secs(1)).await;
        assert_eq!(
            denied,
            Admission {
                allowed: false,
                remaining: 0
            }
        );

        // Denied request was not recorded; after the window the client is
        // back to a full allowance.
        let later = limiter.admit_at("10.0.0.1", t0 + Duration::from_secs(61)).await;
        assert!(later.allowed);
        assert_eq!(later.remaining, 2);
    }

    #[tokio::test]
    async fn clients_are_limited_independently() {
        let limiter = limiter(1, 60);
        let t0 = Instant::now();

        assert!(limiter.admit_at("a", t0).await.allowed);
        assert!(!limiter.admit_at("a", t0).await.allowed);
        assert!(limiter.admit_at("b", t0).await.allowed);
    }

    #[tokio::test]
    async fn window_slides_rather_than_resets() {
        let limiter = limiter(2, 60);
        let t0 = Instant::now();

        assert!(limiter.admit_at("c", t0).await.allowed);
        assert!(limiter.admit_at("c", t0 + Duration::from_secs(30)).await.allowed);
        // t0 request still in window at +45
        assert!(!limiter.admit_at("c", t0 + Duration::from_secs(45)).await.allowed);
        // at +70 the t0 request has aged out but the +30 one has not
        let a = limiter.admit_at("c", t0 + Duration::from_secs(70)).await;
        assert!(a.allowed);
        assert_eq!(a.remaining, 0);
    }

    #[tokio::test]
    async fn stale_clients_are_swept() {
        let limiter = limiter(5, 60);
        let t0 = Instant::now();

        limiter.admit_at("old-1", t0).await;
        limiter.admit_at("old-2", t0).await;
        assert_eq!(limiter.tracked_clients().await, 2);

        limiter.admit_at("fresh", t0 + Duration::from_secs(120)).await;
        assert_eq!(limiter.tracked_clients().await, 1);
    }
}
