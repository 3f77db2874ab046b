//! Wires a single `clawshield_registry::Storage` into the Firewall Orchestrator, handing
//! out a clone of the shared handle as `Arc<dyn X>` for each port it satisfies. This is
//! the only place in the workspace that names every concrete port implementation at
//! once; everything upstream of it only ever sees the trait objects.

use std::sync::Arc;

use clawshield_core::{FirewallOrchestrator, GatewayConfig};
use clawshield_firewall::RuleEngine;
use clawshield_registry::Storage;
use clawshield_skills::SkillAnalyzer;
use clawshield_state::AgentContextRegistry;

use crate::alert::LoggingAlertHandler;

pub fn build_orchestrator(config: GatewayConfig, storage: Arc<Storage>) -> FirewallOrchestrator {
    let dynamic_timeout_ms = config.skills.clamped_dynamic_timeout_ms();

    FirewallOrchestrator::new(
        config,
        Arc::new(RuleEngine::new(storage.clone())),
        Arc::new(AgentContextRegistry::new(storage.clone())),
        storage.clone(),
        storage.clone(),
        storage.clone(),
        storage.clone(),
        storage.clone(),
        Some(Arc::new(LoggingAlertHandler)),
        Arc::new(SkillAnalyzer::new(storage.clone(), storage, Some(dynamic_timeout_ms))),
    )
}
