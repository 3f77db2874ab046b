//! Persistence and notification ports the orchestrator itself consumes, defined here
//! (the consumer) so `clawshield-registry` can satisfy them without this crate
//! depending on a persistence implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ThreatEvent;

/// Port onto the `agent_communication_rules` table, consulted by the agent-to-agent
/// authorization check in `inspect_message` step 2.
#[async_trait]
pub trait CommunicationRuleStore: Send + Sync {
    async fn is_authorized(&self, source_agent_id: &str, target_agent_id: &str) -> Result<bool>;
}

/// Port onto the append-only `threats` table.
#[async_trait]
pub trait ThreatStore: Send + Sync {
    async fn record(&self, event: ThreatEvent) -> Result<()>;
}

/// The nullable `sendAlert` callback, invoked only for `Critical` severity. Errors are
/// logged and swallowed by the orchestrator, never surfaced to the caller.
#[async_trait]
pub trait AlertHandler: Send + Sync {
    async fn send_alert(&self, event: &ThreatEvent) -> Result<()>;
}
