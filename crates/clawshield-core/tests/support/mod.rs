use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clawshield_core::{AlertHandler, CommunicationRuleStore, FirewallOrchestrator, GatewayConfig, ThreatEvent};
use clawshield_firewall::{FirewallRule, RuleEngine, RuleStore};
use clawshield_skills::{MalwareSignature, MalwareSignatureStore, SkillAnalysisResult, SkillAnalyzer, SkillVerdictStore};
use clawshield_state::{
    AgentContextRegistry, AgentStore, InMemoryBlacklist, InMemoryLoopWindowStore, InMemoryRateLimiter,
    PersistedAgent,
};

pub struct StaticRuleStore(pub Vec<FirewallRule>);

#[async_trait]
impl RuleStore for StaticRuleStore {
    async fn load_enabled_rules(&self) -> clawshield_firewall::Result<Vec<FirewallRule>> {
        Ok(self.0.clone())
    }
}

pub struct NoAgentStore;

#[async_trait]
impl AgentStore for NoAgentStore {
    async fn load_agent(&self, _agent_id: &str) -> clawshield_state::Result<Option<PersistedAgent>> {
        Ok(None)
    }
}

#[derive(Default)]
pub struct MapCommunicationRuleStore {
    pub authorized: Mutex<HashMap<(String, String), bool>>,
}

#[async_trait]
impl CommunicationRuleStore for MapCommunicationRuleStore {
    async fn is_authorized(&self, source_agent_id: &str, target_agent_id: &str) -> clawshield_core::Result<bool> {
        Ok(self
            .authorized
            .lock()
            .unwrap()
            .get(&(source_agent_id.to_string(), target_agent_id.to_string()))
            .copied()
            .unwrap_or(false))
    }
}

#[derive(Default)]
pub struct RecordingThreatStore {
    pub events: Mutex<Vec<ThreatEvent>>,
}

#[async_trait]
impl clawshield_core::ThreatStore for RecordingThreatStore {
    async fn record(&self, event: ThreatEvent) -> clawshield_core::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub struct NoopAlertHandler;

#[async_trait]
impl AlertHandler for NoopAlertHandler {
    async fn send_alert(&self, _event: &ThreatEvent) -> clawshield_core::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySkillVerdictStore {
    pub cache: Mutex<HashMap<String, SkillAnalysisResult>>,
}

#[async_trait]
impl SkillVerdictStore for InMemorySkillVerdictStore {
    async fn find_by_hash(&self, code_hash: &str) -> clawshield_skills::Result<Option<SkillAnalysisResult>> {
        Ok(self.cache.lock().unwrap().get(code_hash).cloned())
    }

    async fn upsert(&self, code_hash: &str, _language: &str, result: &SkillAnalysisResult) -> clawshield_skills::Result<()> {
        self.cache.lock().unwrap().insert(code_hash.to_string(), result.clone());
        Ok(())
    }
}

pub struct NoMalwareSignatures;

#[async_trait]
impl MalwareSignatureStore for NoMalwareSignatures {
    async fn load_enabled_signatures(&self) -> clawshield_skills::Result<Vec<MalwareSignature>> {
        Ok(Vec::new())
    }
}

/// Everything a scenario test needs direct handles to, so it can seed blacklist/rate
/// state before exercising the orchestrator.
pub struct Harness {
    pub orchestrator: FirewallOrchestrator,
    pub blacklist: Arc<InMemoryBlacklist>,
    pub rate_limiter: Arc<InMemoryRateLimiter>,
    pub communication_rules: Arc<MapCommunicationRuleStore>,
    pub threats: Arc<RecordingThreatStore>,
}

pub fn harness_with_rules(rules: Vec<FirewallRule>) -> Harness {
    let blacklist = Arc::new(InMemoryBlacklist::new());
    let rate_limiter = Arc::new(InMemoryRateLimiter::new());
    let communication_rules = Arc::new(MapCommunicationRuleStore::default());
    let threats = Arc::new(RecordingThreatStore::default());

    let orchestrator = FirewallOrchestrator::new(
        GatewayConfig::default(),
        Arc::new(RuleEngine::new(Arc::new(StaticRuleStore(rules)))),
        Arc::new(AgentContextRegistry::new(Arc::new(NoAgentStore))),
        rate_limiter.clone(),
        blacklist.clone(),
        Arc::new(InMemoryLoopWindowStore::new()),
        communication_rules.clone(),
        threats.clone(),
        Some(Arc::new(NoopAlertHandler)),
        Arc::new(SkillAnalyzer::new(
            Arc::new(InMemorySkillVerdictStore::default()),
            Arc::new(NoMalwareSignatures),
            Some(1000),
        )),
    );

    Harness {
        orchestrator,
        blacklist,
        rate_limiter,
        communication_rules,
        threats,
    }
}

pub fn harness() -> Harness {
    harness_with_rules(Vec::new())
}
