//! Loop Detector: a rolling, per-agent deque of message fingerprints that flags
//! repetition. A bounded history of exact-match fingerprints, not a general
//! execution-graph cycle check.

use async_trait::async_trait;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::Result;

pub const WINDOW_MAX_LEN: usize = 10;
pub const WINDOW_TTL: Duration = Duration::from_secs(300);
pub const LOOP_TRIGGER_THRESHOLD: usize = 3;
const FINGERPRINT_HEX_LEN: usize = 16;

/// Port over the key-value store's `agent:messages:<id>` list.
#[async_trait]
pub trait LoopWindowStore: Send + Sync {
    async fn read(&self, agent_id: &str) -> Result<Vec<String>>;
    async fn write(&self, agent_id: &str, window: Vec<String>, ttl: Duration) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryLoopWindowStore {
    windows: Mutex<HashMap<String, (Vec<String>, Instant)>>,
}

impl InMemoryLoopWindowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoopWindowStore for InMemoryLoopWindowStore {
    async fn read(&self, agent_id: &str) -> Result<Vec<String>> {
        let windows = self.windows.lock().await;
        match windows.get(agent_id) {
            Some((window, expires_at)) if Instant::now() < *expires_at => Ok(window.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn write(&self, agent_id: &str, window: Vec<String>, ttl: Duration) -> Result<()> {
        let mut windows = self.windows.lock().await;
        windows.insert(agent_id.to_string(), (window, Instant::now() + ttl));
        Ok(())
    }
}

/// The SHA-256 of a canonical serialization of `{type, content, targetAgentId}`,
/// truncated to 16 hex characters.
pub fn fingerprint(message_type: &str, content: Option<&str>, target_agent_id: Option<&str>) -> String {
    let canonical = json!({
        "type": message_type,
        "content": content,
        "targetAgentId": target_agent_id,
    })
    .to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)[..FINGERPRINT_HEX_LEN].to_string()
}

pub struct LoopDetector;

impl LoopDetector {
    /// Reads the agent's current window, counts exact matches of the new message's
    /// fingerprint, prepends it, trims to [`WINDOW_MAX_LEN`], and re-arms the TTL.
    /// Returns `true` when at least [`LOOP_TRIGGER_THRESHOLD`] prior matches existed.
    pub async fn check(
        store: &dyn LoopWindowStore,
        agent_id: &str,
        message_type: &str,
        content: Option<&str>,
        target_agent_id: Option<&str>,
    ) -> Result<bool> {
        let fp = fingerprint(message_type, content, target_agent_id);
        let mut window = store.read(agent_id).await?;
        let prior_matches = window.iter().filter(|existing| **existing == fp).count();

        window.insert(0, fp);
        window.truncate(WINDOW_MAX_LEN);
        store.write(agent_id, window, WINDOW_TTL).await?;

        Ok(prior_matches >= LOOP_TRIGGER_THRESHOLD)
    }
}
