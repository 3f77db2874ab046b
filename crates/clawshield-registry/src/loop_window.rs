//! `sled`-backed `LoopWindowStore`: the `agent:messages:<id>` rolling fingerprint list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use clawshield_state::{LoopWindowStore, Result, StateError};

use crate::storage::{now_millis, Storage};

#[derive(Serialize, Deserialize)]
struct WindowRow {
    fingerprints: Vec<String>,
    expires_at_ms: u64,
}

#[async_trait]
impl LoopWindowStore for Storage {
    async fn read(&self, agent_id: &str) -> Result<Vec<String>> {
        let Some(bytes) = self
            .messages
            .get(agent_id.as_bytes())
            .map_err(|e| StateError::Store(e.to_string()))?
        else {
            return Ok(Vec::new());
        };
        let row: WindowRow = serde_json::from_slice(&bytes).map_err(StateError::Serde)?;
        if now_millis() < row.expires_at_ms {
            Ok(row.fingerprints)
        } else {
            Ok(Vec::new())
        }
    }

    async fn write(&self, agent_id: &str, window: Vec<String>, ttl: Duration) -> Result<()> {
        let row = WindowRow {
            fingerprints: window,
            expires_at_ms: now_millis() + ttl.as_millis() as u64,
        };
        let bytes = serde_json::to_vec(&row).map_err(StateError::Serde)?;
        self.messages
            .insert(agent_id.as_bytes(), bytes)
            .map_err(|e| StateError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_window_reads_as_empty() {
        let storage = Storage::temporary().unwrap();
        assert!(storage.read("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn written_window_round_trips_until_ttl_expires() {
        let storage = Storage::temporary().unwrap();
        storage
            .write("a", vec!["abc".to_string()], Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(storage.read("a").await.unwrap(), vec!["abc".to_string()]);

        storage
            .write("b", vec!["xyz".to_string()], Duration::from_millis(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(storage.read("b").await.unwrap().is_empty());
    }
}
