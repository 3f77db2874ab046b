//! `sled`-backed `BlacklistStore`: the `agent:blacklist:<id>` key, TTL via a stored
//! expiry timestamp.

use async_trait::async_trait;
use std::time::Duration;

use clawshield_state::{BlacklistStore, Result, StateError};

use crate::storage::{now_millis, Storage};

#[async_trait]
impl BlacklistStore for Storage {
    async fn is_blacklisted(&self, agent_id: &str) -> Result<bool> {
        let Some(bytes) = self
            .blacklist
            .get(agent_id.as_bytes())
            .map_err(|e| StateError::Store(e.to_string()))?
        else {
            return Ok(false);
        };
        let expires_at_ms: u64 = serde_json::from_slice(&bytes).map_err(StateError::Serde)?;
        Ok(now_millis() < expires_at_ms)
    }

    async fn add(&self, agent_id: &str, ttl: Duration) -> Result<()> {
        let expires_at_ms = now_millis() + ttl.as_millis() as u64;
        let bytes = serde_json::to_vec(&expires_at_ms).map_err(StateError::Serde)?;
        self.blacklist
            .insert(agent_id.as_bytes(), bytes)
            .map_err(|e| StateError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unlisted_agent_is_not_blacklisted() {
        let storage = Storage::temporary().unwrap();
        assert!(!storage.is_blacklisted("a").await.unwrap());
    }

    #[tokio::test]
    async fn added_agent_is_blacklisted_until_ttl_expires() {
        let storage = Storage::temporary().unwrap();
        storage.add("bad", Duration::from_millis(1)).await.unwrap();
        assert!(storage.is_blacklisted("bad").await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!storage.is_blacklisted("bad").await.unwrap());
    }
}
