//! Blacklist: a key-value existence check over `agent:blacklist:<id>`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::Result;

pub const DEFAULT_BLACKLIST_TTL: Duration = Duration::from_secs(3600);

#[async_trait]
pub trait BlacklistStore: Send + Sync {
    async fn is_blacklisted(&self, agent_id: &str) -> Result<bool>;
    async fn add(&self, agent_id: &str, ttl: Duration) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryBlacklist {
    entries: Mutex<HashMap<String, Instant>>,
}

impl InMemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlacklistStore for InMemoryBlacklist {
    async fn is_blacklisted(&self, agent_id: &str) -> Result<bool> {
        let entries = self.entries.lock().await;
        Ok(entries.get(agent_id).is_some_and(|expires| Instant::now() < *expires))
    }

    async fn add(&self, agent_id: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(agent_id.to_string(), Instant::now() + ttl);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unlisted_agent_is_not_blacklisted() {
        let blacklist = InMemoryBlacklist::new();
        assert!(!blacklist.is_blacklisted("agent-a").await.unwrap());
    }

    #[tokio::test]
    async fn added_agent_is_blacklisted() {
        let blacklist = InMemoryBlacklist::new();
        blacklist.add("bad", DEFAULT_BLACKLIST_TTL).await.unwrap();
        assert!(blacklist.is_blacklisted("bad").await.unwrap());
        assert!(!blacklist.is_blacklisted("other").await.unwrap());
    }

    #[tokio::test]
    async fn expired_entry_is_no_longer_blacklisted() {
        let blacklist = InMemoryBlacklist::new();
        blacklist.add("bad", Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!blacklist.is_blacklisted("bad").await.unwrap());
    }
}
