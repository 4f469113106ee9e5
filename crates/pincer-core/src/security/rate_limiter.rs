//! Sliding-window rate limiter keyed by caller
//!
//! Each identity owns its own window behind its own mutex. Purging, counting
//! and recording happen under that one lock, so concurrent calls for the same
//! identity can never both take the last slot, while different identities
//! never contend.

use crate::identity::UserId;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Rate limiter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum authorized calls in the window
    pub max_requests: u32,
    /// Trailing window
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Create a new rate limit config
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Create config for requests per minute
    #[must_use]
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the call was admitted (and recorded)
    pub allowed: bool,
    /// Calls in the window, including this one if admitted
    pub current: u32,
    /// Calls left in the window
    pub remaining: u32,
    /// Time until the oldest call leaves the window
    pub retry_after: Duration,
}

type Window = VecDeque<Instant>;

/// In-memory sliding-window limiter
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<UserId, Arc<Mutex<Window>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn slot(&self, user: &UserId) -> Arc<Mutex<Window>> {
        Arc::clone(self.windows.entry(user.clone()).or_default().value())
    }

    fn purge(&self, window: &mut Window, now: Instant) {
        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= self.config.window {
                window.pop_front();
            } else {
                break;
            }
        }
    }

    fn retry_after(&self, window: &Window, now: Instant) -> Duration {
        window
            .front()
            .map(|oldest| self.config.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.config.window)
    }

    /// Admit and record a call if the window has room.
    ///
    /// A denied call is not recorded.
    pub fn acquire(&self, user: &UserId) -> RateLimitResult {
        let now = Instant::now();
        let slot = self.slot(user);
        let mut window = slot.lock().unwrap_or_else(|e| e.into_inner());
        self.purge(&mut window, now);

        let count = window.len() as u32;
        if count >= self.config.max_requests {
            return RateLimitResult {
                allowed: false,
                current: count,
                remaining: 0,
                retry_after: self.retry_after(&window, now),
            };
        }

        window.push_back(now);
        let current = count + 1;
        RateLimitResult {
            allowed: true,
            current,
            remaining: self.config.max_requests - current,
            retry_after: self.retry_after(&window, now),
        }
    }

    /// Current usage as `(calls in window, max)`
    #[must_use]
    pub fn usage(&self, user: &UserId) -> (u32, u32) {
        let now = Instant::now();
        let current = self.windows.get(user).map_or(0, |slot| {
            let mut window = slot.lock().unwrap_or_else(|e| e.into_inner());
            self.purge(&mut window, now);
            window.len() as u32
        });
        (current, self.config.max_requests)
    }

    /// Forget an identity's window
    pub fn reset(&self, user: &UserId) {
        self.windows.remove(user);
    }

    /// Drop idle identities, returning how many were removed.
    ///
    /// A window is only dropped while nobody else holds it, so a call in
    /// flight can never record into a window that was just discarded.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            let mut window = slot.lock().unwrap_or_else(|e| e.into_inner());
            self.purge(&mut window, now);
            !window.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked identities
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}
