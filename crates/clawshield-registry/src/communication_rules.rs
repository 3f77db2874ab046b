//! `sled`-backed `CommunicationRuleStore`: the read-only `agent_communication_rules`
//! table, keyed by `<source>:<target>`.

use async_trait::async_trait;
use clawshield_core::{CommunicationRuleStore, GatewayError, Result};

use crate::storage::Storage;

fn key(source_agent_id: &str, target_agent_id: &str) -> Vec<u8> {
    format!("{source_agent_id}:{target_agent_id}").into_bytes()
}

impl Storage {
    /// Authorizes (or revokes) one source-to-target communication pair; exposed for
    /// operator tooling and tests, since the table is read-only from the orchestrator.
    pub fn put_communication_rule(
        &self,
        source_agent_id: &str,
        target_agent_id: &str,
        enabled: bool,
    ) -> crate::error::Result<()> {
        let bytes = serde_json::to_vec(&enabled)?;
        self.communication_rules
            .insert(key(source_agent_id, target_agent_id), bytes)?;
        Ok(())
    }
}

#[async_trait]
impl CommunicationRuleStore for Storage {
    async fn is_authorized(&self, source_agent_id: &str, target_agent_id: &str) -> Result<bool> {
        let Some(bytes) = self
            .communication_rules
            .get(key(source_agent_id, target_agent_id))
            .map_err(|e| GatewayError::Store(e.to_string()))?
        else {
            return Ok(false);
        };
        let enabled: bool =
            serde_json::from_slice(&bytes).map_err(|e| GatewayError::Store(e.to_string()))?;
        Ok(enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_pair_is_unauthorized() {
        let storage = Storage::temporary().unwrap();
        assert!(!storage.is_authorized("a", "b").await.unwrap());
    }

    #[tokio::test]
    async fn authorized_pair_round_trips() {
        let storage = Storage::temporary().unwrap();
        storage.put_communication_rule("a", "b", true).unwrap();
        assert!(storage.is_authorized("a", "b").await.unwrap());
        assert!(!storage.is_authorized("b", "a").await.unwrap());
    }
}
