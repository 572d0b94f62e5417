//! Rate limiter guarding OTP verification and login against brute force

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed inside one window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,
            ban_duration_seconds: 900,
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    attempts: u32,
    window_started: Instant,
    ban_expires: Option<Instant>,
}

impl RateLimiterEntry {
    /// Neither banned nor inside an open window; safe to forget
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        self.ban_expires.is_none_or(|expires| now >= expires)
            && now.duration_since(self.window_started) >= window
    }
}

#[derive(Debug)]
struct Entries {
    by_key: HashMap<String, RateLimiterEntry>,
    last_sweep: Instant,
}

/// Per-key attempt counter, shared by every handler clone
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<Entries>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(Entries {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    /// Record an attempt for `key`; false when the key is banned
    pub async fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now()).await
    }

    async fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        let window = Duration::from_secs(self.config.window_seconds);
        let mut entries = self.entries.lock().await;

        // Keys that were only seen once would otherwise stay forever
        if now.saturating_duration_since(entries.last_sweep) >= window {
            let before = entries.by_key.len();
            entries.by_key.retain(|_, entry| !entry.is_stale(now, window));
            entries.last_sweep = now;
            debug!("Rate limiter swept {} stale keys", before - entries.by_key.len());
        }

        let entry = entries.by_key.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            window_started: now,
            ban_expires: None,
        });

        if let Some(ban_expires) = entry.ban_expires {
            if now < ban_expires {
                return false;
            }
            entry.attempts = 0;
            entry.ban_expires = None;
            entry.window_started = now;
        }

        if now.duration_since(entry.window_started) >= window {
            entry.attempts = 0;
            entry.window_started = now;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Banned key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        true
    }

    /// Forget every attempt of `key`, used after a successful login
    pub async fn reset(&self, key: &str) {
        if self.entries.lock().await.by_key.remove(key).is_some() {
            debug!("Rate limiter reset for key {}", key);
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.entries.lock().await.by_key.len()
    }
}
