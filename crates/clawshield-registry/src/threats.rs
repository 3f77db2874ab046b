//! `sled`-backed `ThreatStore`: the append-only `threats` table, with the `details`
//! blob sealed at rest via [`crate::sealed_box`].

use async_trait::async_trait;
use clawshield_core::{GatewayError, Result, ThreatEvent};
use clawshield_firewall::{ThreatLevel, ThreatType};
use serde::{Deserialize, Serialize};

use crate::sealed_box;
use crate::storage::Storage;

#[derive(Serialize, Deserialize)]
struct ThreatRow {
    agent_id: String,
    threat_type: ThreatType,
    severity: ThreatLevel,
    sealed_details: Vec<u8>,
    resolved: bool,
    created_at: u64,
}

impl Storage {
    /// Lists every recorded threat event for an agent, unsealing `details` with the
    /// registry's own key. Exposed for operator tooling, not consumed by the pipeline.
    pub fn list_threats(&self, agent_id: &str) -> crate::error::Result<Vec<ThreatEvent>> {
        let key = self.threat_details_key()?;
        let mut events = Vec::new();
        for entry in self.threats.iter() {
            let (_, bytes) = entry?;
            let row: ThreatRow = serde_json::from_slice(&bytes)?;
            if row.agent_id != agent_id {
                continue;
            }
            let details_bytes = sealed_box::open(&row.sealed_details, &key)?;
            let details = serde_json::from_slice(&details_bytes)?;
            events.push(ThreatEvent {
                agent_id: row.agent_id,
                threat_type: row.threat_type,
                severity: row.severity,
                details,
                resolved: row.resolved,
                created_at: row.created_at,
            });
        }
        Ok(events)
    }
}

#[async_trait]
impl clawshield_core::ThreatStore for Storage {
    async fn record(&self, event: ThreatEvent) -> Result<()> {
        let key = self
            .threat_details_key()
            .map_err(|e| GatewayError::Store(e.to_string()))?;
        let details_bytes =
            serde_json::to_vec(&event.details).map_err(|e| GatewayError::Store(e.to_string()))?;
        let sealed_details = sealed_box::seal(&details_bytes, &key)
            .map_err(|e| GatewayError::Store(e.to_string()))?;

        let row = ThreatRow {
            agent_id: event.agent_id,
            threat_type: event.threat_type,
            severity: event.severity,
            sealed_details,
            resolved: event.resolved,
            created_at: event.created_at,
        };
        let bytes = serde_json::to_vec(&row).map_err(|e| GatewayError::Store(e.to_string()))?;
        let id = uuid::Uuid::new_v4();
        self.threats
            .insert(id.as_bytes(), bytes)
            .map_err(|e| GatewayError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawshield_core::ThreatStore;
    use serde_json::json;

    #[tokio::test]
    async fn recorded_event_is_listed_back_with_details_intact() {
        let storage = Storage::temporary().unwrap();
        let event = ThreatEvent::new("agent-a", ThreatType::PromptInjection, json!({"excerpt": "ignore all"}));
        storage.record(event).await.unwrap();

        let events = storage.list_threats("agent-a").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].threat_type, ThreatType::PromptInjection);
        assert_eq!(events[0].details["excerpt"], "ignore all");
    }

    #[tokio::test]
    async fn events_for_other_agents_are_not_returned() {
        let storage = Storage::temporary().unwrap();
        storage
            .record(ThreatEvent::new("agent-a", ThreatType::RateLimitExceeded, json!({})))
            .await
            .unwrap();
        assert!(storage.list_threats("agent-b").unwrap().is_empty());
    }
}
