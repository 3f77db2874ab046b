//! Wiring and lifecycle tests: idempotent registration, structural validation, and the
//! fail-closed contract, as opposed to the scenario-driven behavior tests.

mod support;

use clawshield_core::validate;
use clawshield_state::{AgentContextPatch, AgentContextRegistry, AgentStatus, PersistedAgent};
use support::{harness, NoAgentStore};
use std::sync::Arc;

#[tokio::test]
async fn invalid_message_is_denied_as_structural() {
    let harness = harness();
    let result = harness.orchestrator.inspect_message("a", "{\"bogus\":true}").await;
    assert!(!result.allowed);
    assert_eq!(result.reason.as_deref(), Some("Invalid message format"));
}

#[tokio::test]
async fn register_agent_twice_with_identical_data_is_idempotent() {
    let registry = AgentContextRegistry::new(Arc::new(NoAgentStore));

    let patch = AgentContextPatch {
        status: Some(AgentStatus::Active),
        max_requests_per_minute: Some(50),
        ..Default::default()
    };
    registry.register("agent-x", patch.clone()).await.unwrap();
    registry.record_request("agent-x").await.unwrap();
    registry.record_request("agent-x").await.unwrap();

    let before = registry.get("agent-x").await.unwrap();
    assert_eq!(before.request_count, 2);

    registry.register("agent-x", AgentContextPatch::default()).await.unwrap();
    let after = registry.get("agent-x").await.unwrap();

    assert_eq!(after.request_count, 2, "omitted fields must preserve existing counters");
    assert_eq!(after.max_requests_per_minute, 50);
}

#[tokio::test]
async fn hydration_pulls_persisted_agent_row_on_first_reference() {
    struct FixedAgentStore;

    #[async_trait::async_trait]
    impl clawshield_state::AgentStore for FixedAgentStore {
        async fn load_agent(&self, _agent_id: &str) -> clawshield_state::Result<Option<PersistedAgent>> {
            Ok(Some(PersistedAgent {
                name: "hydrated".to_string(),
                status: AgentStatus::Active,
                permissions: vec![],
                trusted_domains: vec!["example.com".to_string()],
                max_requests_per_minute: 250,
            }))
        }
    }

    let registry = AgentContextRegistry::new(Arc::new(FixedAgentStore));
    let ctx = registry.get("agent-y").await.unwrap();
    assert_eq!(ctx.max_requests_per_minute, 250);
    assert_eq!(ctx.trusted_domains, vec!["example.com".to_string()]);
}

#[test]
fn well_formed_agent_message_validates() {
    let raw = r#"{"type":"ping"}"#;
    assert!(validate(raw).is_ok());
}
