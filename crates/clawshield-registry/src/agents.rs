//! `sled`-backed `AgentStore`: the read-only `agents` table.

use async_trait::async_trait;
use clawshield_state::{AgentStatus, Permission, PersistedAgent};
use serde::{Deserialize, Serialize};

use crate::storage::Storage;

#[derive(Debug, Serialize, Deserialize)]
struct AgentRow {
    name: String,
    status: AgentStatus,
    permissions: Vec<Permission>,
    trusted_domains: Vec<String>,
    max_requests_per_minute: u32,
}

impl From<AgentRow> for PersistedAgent {
    fn from(row: AgentRow) -> Self {
        PersistedAgent {
            name: row.name,
            status: row.status,
            permissions: row.permissions,
            trusted_domains: row.trusted_domains,
            max_requests_per_minute: row.max_requests_per_minute,
        }
    }
}

impl Storage {
    /// Seeds or overwrites an `agents` row; exposed for operator tooling and tests,
    /// since the table itself is read-only from the firewall's point of view.
    pub fn put_agent(&self, agent_id: &str, agent: &PersistedAgent) -> crate::error::Result<()> {
        let row = AgentRow {
            name: agent.name.clone(),
            status: agent.status,
            permissions: agent.permissions.clone(),
            trusted_domains: agent.trusted_domains.clone(),
            max_requests_per_minute: agent.max_requests_per_minute,
        };
        let bytes = serde_json::to_vec(&row)?;
        self.agents.insert(agent_id.as_bytes(), bytes)?;
        Ok(())
    }
}

#[async_trait]
impl clawshield_state::AgentStore for Storage {
    async fn load_agent(&self, agent_id: &str) -> clawshield_state::Result<Option<PersistedAgent>> {
        let Some(bytes) = self
            .agents
            .get(agent_id.as_bytes())
            .map_err(|e| clawshield_state::StateError::Store(e.to_string()))?
        else {
            return Ok(None);
        };
        let row: AgentRow =
            serde_json::from_slice(&bytes).map_err(clawshield_state::StateError::Serde)?;
        Ok(Some(row.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawshield_state::AgentStore;

    #[tokio::test]
    async fn unknown_agent_is_none() {
        let storage = Storage::temporary().unwrap();
        assert!(storage.load_agent("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeded_agent_round_trips() {
        let storage = Storage::temporary().unwrap();
        let agent = PersistedAgent {
            name: "a".to_string(),
            status: AgentStatus::Active,
            permissions: vec![Permission::Read, Permission::Write],
            trusted_domains: vec!["example.com".to_string()],
            max_requests_per_minute: 250,
        };
        storage.put_agent("agent-a", &agent).unwrap();

        let loaded = storage.load_agent("agent-a").await.unwrap().unwrap();
        assert_eq!(loaded.name, "a");
        assert_eq!(loaded.max_requests_per_minute, 250);
        assert_eq!(loaded.trusted_domains, vec!["example.com".to_string()]);
    }
}
