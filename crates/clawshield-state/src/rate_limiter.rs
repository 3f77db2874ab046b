//! Rate limiter: atomic per-agent increment with a 60-second window established on the
//! first increment. A small owned counter whose window re-arms itself on expiry rather
//! than needing an explicit reset call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::Result;

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Port over the key-value store's `agent:ratelimit:<id>` counter.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Increments the agent's counter (establishing a fresh 60s window if none is
    /// active) and returns the post-increment count.
    async fn increment(&self, agent_id: &str) -> Result<u32>;
}

struct Window {
    count: u32,
    expires_at: Instant,
}

/// Single-process reference implementation; production deployments swap this for a
/// Redis-backed (or equivalent) implementation of the same port.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn increment(&self, agent_id: &str) -> Result<u32> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let window = windows.entry(agent_id.to_string()).or_insert(Window {
            count: 0,
            expires_at: now + RATE_LIMIT_WINDOW,
        });
        if now >= window.expires_at {
            window.count = 0;
            window.expires_at = now + RATE_LIMIT_WINDOW;
        }
        window.count += 1;
        Ok(window.count)
    }
}

/// Evaluates the result of [`RateLimiter::increment`] against the agent's configured
/// per-minute cap (default 100).
pub fn exceeds_cap(count: u32, cap: u32) -> bool {
    count > cap
}
