//! `sled`-backed `RateLimiter`: the `agent:ratelimit:<id>` counter, TTL enforced by
//! storing an expiry timestamp alongside the count and treating an expired read as a
//! fresh window.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use clawshield_state::{RateLimiter, Result, StateError, RATE_LIMIT_WINDOW};

use crate::storage::{now_millis, Storage};

#[derive(Serialize, Deserialize)]
struct Window {
    count: u32,
    expires_at_ms: u64,
}

#[async_trait]
impl RateLimiter for Storage {
    async fn increment(&self, agent_id: &str) -> Result<u32> {
        let key = agent_id.as_bytes();
        let now = now_millis();

        let existing = self
            .ratelimit
            .get(key)
            .map_err(|e| StateError::Store(e.to_string()))?;

        let window = match existing {
            Some(bytes) => {
                let window: Window = serde_json::from_slice(&bytes).map_err(StateError::Serde)?;
                if now >= window.expires_at_ms {
                    Window {
                        count: 1,
                        expires_at_ms: now + RATE_LIMIT_WINDOW.as_millis() as u64,
                    }
                } else {
                    Window {
                        count: window.count + 1,
                        expires_at_ms: window.expires_at_ms,
                    }
                }
            }
            None => Window {
                count: 1,
                expires_at_ms: now + RATE_LIMIT_WINDOW.as_millis() as u64,
            },
        };

        let bytes = serde_json::to_vec(&window).map_err(StateError::Serde)?;
        self.ratelimit
            .insert(key, bytes)
            .map_err(|e| StateError::Store(e.to_string()))?;
        Ok(window.count)
    }
}
