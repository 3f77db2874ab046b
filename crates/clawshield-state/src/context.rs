//! Agent Context: the in-memory, orchestrator-owned record of one agent's status,
//! permissions, and rolling counters. Every other component receives it by
//! reference; only the firewall orchestrator mutates it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
    Blocked,
    Quarantined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Execute,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub name: String,
    pub status: AgentStatus,
    pub permissions: Vec<Permission>,
    pub trusted_domains: Vec<String>,
    pub max_requests_per_minute: u32,
    pub request_count: u64,
    pub last_seen: Option<u64>,
    pub threat_score: f64,
    pub recent_messages: Vec<String>,
    pub peer_ip: Option<String>,
    pub connected_at: Option<u64>,
}

impl AgentContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: AgentStatus::Active,
            permissions: vec![Permission::Read],
            trusted_domains: Vec::new(),
            max_requests_per_minute: 100,
            request_count: 0,
            last_seen: None,
            threat_score: 0.0,
            recent_messages: Vec::new(),
            peer_ip: None,
            connected_at: None,
        }
    }

    /// Merges `patch` onto `self`: any field the caller omitted (represented here as
    /// the corresponding `Option`/empty collection on `patch`) preserves the existing
    /// value, so repeated identical registration calls are idempotent.
    fn merge_from(&mut self, patch: AgentContextPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(permissions) = patch.permissions {
            self.permissions = permissions;
        }
        if let Some(trusted_domains) = patch.trusted_domains {
            self.trusted_domains = trusted_domains;
        }
        if let Some(cap) = patch.max_requests_per_minute {
            self.max_requests_per_minute = cap;
        }
        if let Some(peer_ip) = patch.peer_ip {
            self.peer_ip = Some(peer_ip);
        }
    }
}

/// A partial update for [`AgentContext::merge_from`]. Every field is optional; `None`
/// means "leave whatever is already recorded alone," which is what makes repeated
/// identical registration calls idempotent.
#[derive(Debug, Clone, Default)]
pub struct AgentContextPatch {
    pub status: Option<AgentStatus>,
    pub permissions: Option<Vec<Permission>>,
    pub trusted_domains: Option<Vec<String>>,
    pub max_requests_per_minute: Option<u32>,
    pub peer_ip: Option<String>,
}

/// Persisted agent row the registry hydrates from on first reference to an identifier
/// it hasn't seen yet.
#[derive(Debug, Clone)]
pub struct PersistedAgent {
    pub name: String,
    pub status: AgentStatus,
    pub permissions: Vec<Permission>,
    pub trusted_domains: Vec<String>,
    pub max_requests_per_minute: u32,
}

/// Port onto the relational `agents` table. Defined here (the consumer) rather than in
/// the persistence crate, so `clawshield-state` never depends on `clawshield-registry`.
#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn load_agent(&self, agent_id: &str) -> Result<Option<PersistedAgent>>;
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The process-wide, typed owner of every agent's in-memory context. Per-agent updates
/// are guarded by a per-entry `Mutex` so that bumping one agent's counters never blocks
/// another agent's inspection.
pub struct AgentContextRegistry {
    store: Arc<dyn AgentStore>,
    entries: tokio::sync::RwLock<HashMap<String, Arc<Mutex<AgentContext>>>>,
}

impl AgentContextRegistry {
    pub fn new(store: Arc<dyn AgentStore>) -> Self {
        Self {
            store,
            entries: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    /// Returns the agent's entry, hydrating it from the persistence layer if this is
    /// the first reference in-process.
    async fn entry(&self, agent_id: &str) -> Result<Arc<Mutex<AgentContext>>> {
        if let Some(existing) = self.entries.read().await.get(agent_id) {
            return Ok(existing.clone());
        }

        let hydrated = match self.store.load_agent(agent_id).await? {
            Some(row) => AgentContext {
                name: row.name,
                status: row.status,
                permissions: row.permissions,
                trusted_domains: row.trusted_domains,
                max_requests_per_minute: row.max_requests_per_minute,
                ..AgentContext::new(agent_id)
            },
            None => AgentContext::new(agent_id),
        };

        let mut entries = self.entries.write().await;
        let slot = entries
            .entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(hydrated)));
        Ok(slot.clone())
    }

    /// Registers (or idempotently re-registers) an agent. Existing
    /// `request_count`, `connected_at`, `threat_score`, `recent_messages`, and
    /// `trusted_domains` survive a patch that omits them.
    pub async fn register(&self, agent_id: &str, patch: AgentContextPatch) -> Result<()> {
        let slot = self.entry(agent_id).await?;
        let mut ctx = slot.lock().await;
        ctx.merge_from(patch);
        Ok(())
    }

    pub async fn get(&self, agent_id: &str) -> Result<AgentContext> {
        let slot = self.entry(agent_id).await?;
        Ok(slot.lock().await.clone())
    }

    /// Bumps `request_count` and `last_seen`, matching the orchestrator's step 5.
    pub async fn record_request(&self, agent_id: &str) -> Result<()> {
        let slot = self.entry(agent_id).await?;
        let mut ctx = slot.lock().await;
        ctx.request_count += 1;
        ctx.last_seen = Some(now_millis());
        Ok(())
    }

    pub async fn unregister(&self, agent_id: &str) {
        self.entries.write().await.remove(agent_id);
    }
}
