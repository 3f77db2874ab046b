//! The Firewall Orchestrator facade: the `inspect_request` / `inspect_message` /
//! `analyze_skill` entry points.
//!
//! A plain struct holding each collaborator as a typed capability, private `check_*`
//! steps that return `Ok(Some(verdict))` to short-circuit or `Ok(None)` to continue,
//! and a final catch-all that folds any `GatewayError` into a fail-closed deny rather
//! than letting it escape.

use std::collections::HashMap;
use std::sync::Arc;

use clawshield_firewall::{
    PromptInjectionDetector, RuleEngine, RuleVerdict, ScoringContext, ThreatLevel, ThreatScorer,
    ThreatType,
};
use clawshield_skills::{SkillAnalysisResult, SkillAnalyzer};
use clawshield_state::{AgentContextRegistry, BlacklistStore, LoopDetector, LoopWindowStore, RateLimiter};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::message::{self, AgentMessage, MessageType};
use crate::models::{InspectionResult, ThreatEvent};
use crate::ports::{AlertHandler, CommunicationRuleStore, ThreatStore};

pub struct FirewallOrchestrator {
    config: GatewayConfig,
    rule_engine: Arc<RuleEngine>,
    agents: Arc<AgentContextRegistry>,
    rate_limiter: Arc<dyn RateLimiter>,
    blacklist: Arc<dyn BlacklistStore>,
    loop_window_store: Arc<dyn LoopWindowStore>,
    communication_rules: Arc<dyn CommunicationRuleStore>,
    threats: Arc<dyn ThreatStore>,
    alert_handler: Option<Arc<dyn AlertHandler>>,
    skill_analyzer: Arc<SkillAnalyzer>,
}

impl FirewallOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: GatewayConfig,
        rule_engine: Arc<RuleEngine>,
        agents: Arc<AgentContextRegistry>,
        rate_limiter: Arc<dyn RateLimiter>,
        blacklist: Arc<dyn BlacklistStore>,
        loop_window_store: Arc<dyn LoopWindowStore>,
        communication_rules: Arc<dyn CommunicationRuleStore>,
        threats: Arc<dyn ThreatStore>,
        alert_handler: Option<Arc<dyn AlertHandler>>,
        skill_analyzer: Arc<SkillAnalyzer>,
    ) -> Self {
        Self {
            config,
            rule_engine,
            agents,
            rate_limiter,
            blacklist,
            loop_window_store,
            communication_rules,
            threats,
            alert_handler,
            skill_analyzer,
        }
    }

    /// HTTP surface. Infallible from the caller's point of view: any port failure is
    /// caught here and folded into a fail-closed deny, never returned as `Err`.
    pub async fn inspect_request(
        &self,
        agent_id: Option<&str>,
        method: &str,
        path: &str,
        body: Option<&str>,
        headers: Option<&HashMap<String, String>>,
        ip: Option<&str>,
    ) -> InspectionResult {
        match self.try_inspect_request(agent_id, method, path, body, headers, ip).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "inspection pipeline failed, denying fail-closed");
                InspectionResult::deny("Inspection error", ThreatLevel::Unknown)
            }
        }
    }

    async fn try_inspect_request(
        &self,
        agent_id: Option<&str>,
        method: &str,
        path: &str,
        body: Option<&str>,
        headers: Option<&HashMap<String, String>>,
        ip: Option<&str>,
    ) -> Result<InspectionResult> {
        let body = body.unwrap_or("");
        let headers = headers.cloned().unwrap_or_default();

        if let Some(verdict) = self.check_blacklist(agent_id).await? {
            return Ok(verdict);
        }
        if let Some(verdict) = self.check_rate_limit(agent_id).await? {
            return Ok(verdict);
        }
        if let Some(verdict) = self.check_rules(agent_id, method, path, body, &headers, ip).await? {
            return Ok(verdict);
        }

        let request_count = match agent_id {
            Some(id) => self.agents.get(id).await?.request_count,
            None => 0,
        };
        let scoring_ctx = ScoringContext {
            body,
            path,
            headers: &headers,
            request_count,
            time_since_last_request_ms: None,
        };
        let score = ThreatScorer::score(&scoring_ctx);
        if score.score > self.config.firewall.threat_score_threshold {
            self.record_deny(
                agent_id,
                ThreatType::HighThreatScore,
                json!({"score": score.score}),
            )
            .await;
            debug!(score = score.score, "denying: composite threat score over threshold");
            return Ok(InspectionResult::deny(
                format!("Threat score {:.2} exceeds threshold", score.score),
                ThreatLevel::High,
            ));
        }

        if let Some(id) = agent_id {
            self.agents.record_request(id).await?;
        }
        debug!(?agent_id, method, path, "request allowed");
        Ok(InspectionResult::allow_with_score(score.score))
    }

    async fn check_blacklist(&self, agent_id: Option<&str>) -> Result<Option<InspectionResult>> {
        let Some(id) = agent_id else { return Ok(None) };
        if self.blacklist.is_blacklisted(id).await? {
            warn!(agent_id = id, "denying: agent is blacklisted");
            return Ok(Some(InspectionResult::deny("Agent is blacklisted", ThreatLevel::Critical)));
        }
        Ok(None)
    }

    async fn check_rate_limit(&self, agent_id: Option<&str>) -> Result<Option<InspectionResult>> {
        let Some(id) = agent_id else { return Ok(None) };
        let count = self.rate_limiter.increment(id).await?;
        let cap = self.agents.get(id).await?.max_requests_per_minute;
        if clawshield_state::exceeds_cap(count, cap) {
            self.record_deny(
                Some(id),
                ThreatType::RateLimitExceeded,
                json!({"count": count, "cap": cap}),
            )
            .await;
            warn!(agent_id = id, count, cap, "denying: rate limit exceeded");
            return Ok(Some(InspectionResult::deny("Rate limit exceeded", ThreatLevel::Medium)));
        }
        Ok(None)
    }

    async fn check_rules(
        &self,
        agent_id: Option<&str>,
        method: &str,
        path: &str,
        body: &str,
        headers: &HashMap<String, String>,
        ip: Option<&str>,
    ) -> Result<Option<InspectionResult>> {
        let mut ctx: HashMap<String, Value> = HashMap::new();
        ctx.insert("method".to_string(), Value::String(method.to_string()));
        ctx.insert("path".to_string(), Value::String(path.to_string()));
        ctx.insert("body".to_string(), Value::String(body.to_string()));
        ctx.insert("content".to_string(), Value::String(body.to_string()));
        ctx.insert("ip".to_string(), Value::String(ip.unwrap_or("").to_string()));
        ctx.insert("agentId".to_string(), Value::String(agent_id.unwrap_or("").to_string()));
        if !headers.is_empty() {
            let header_map: serde_json::Map<String, Value> = headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            ctx.insert("headers".to_string(), Value::Object(header_map));
        }

        match self.rule_engine.evaluate(&ctx).await? {
            RuleVerdict::Deny { reason, level, .. } => {
                self.record_deny(agent_id, ThreatType::RuleViolation, json!({"method": method, "path": path}))
                    .await;
                warn!(%reason, "denying: matched firewall rule");
                Ok(Some(InspectionResult::deny(reason, level)))
            }
            RuleVerdict::Allow => Ok(Some(InspectionResult::allow())),
            RuleVerdict::Continue => Ok(None),
        }
    }

    /// WebSocket surface.
    pub async fn inspect_message(&self, agent_id: &str, raw_message: &str) -> InspectionResult {
        match self.try_inspect_message(agent_id, raw_message).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "inspection pipeline failed, denying fail-closed");
                InspectionResult::deny("Inspection error", ThreatLevel::Unknown)
            }
        }
    }

    async fn try_inspect_message(&self, agent_id: &str, raw_message: &str) -> Result<InspectionResult> {
        let message = match message::validate(raw_message) {
            Ok(message) => message,
            Err(_) => return Ok(InspectionResult::deny("Invalid message format", ThreatLevel::Low)),
        };

        if let Some(verdict) = self.check_authorization(agent_id, &message).await? {
            return Ok(verdict);
        }
        if let Some(verdict) = self.check_loop(agent_id, &message).await? {
            return Ok(verdict);
        }
        if let Some(verdict) = self.check_injection(agent_id, &message).await? {
            return Ok(verdict);
        }
        if let Some(verdict) = self.check_exfiltration(agent_id, &message).await? {
            return Ok(verdict);
        }

        debug!(agent_id, "message allowed");
        Ok(InspectionResult::allow())
    }

    async fn check_authorization(
        &self,
        agent_id: &str,
        message: &AgentMessage,
    ) -> Result<Option<InspectionResult>> {
        if !matches!(message.message_type, MessageType::SessionsSend | MessageType::SessionsSpawn) {
            return Ok(None);
        }
        let Some(target) = &message.target_agent_id else { return Ok(None) };

        if !self.communication_rules.is_authorized(agent_id, target).await? {
            self.record_deny(
                Some(agent_id),
                ThreatType::UnauthorizedAgentCommunication,
                json!({"targetAgentId": target}),
            )
            .await;
            warn!(agent_id, target, "denying: unauthorized agent-to-agent communication");
            return Ok(Some(InspectionResult::deny(
                "Unauthorized agent communication",
                ThreatLevel::High,
            )));
        }
        Ok(None)
    }

    async fn check_loop(&self, agent_id: &str, message: &AgentMessage) -> Result<Option<InspectionResult>> {
        let triggered = LoopDetector::check(
            self.loop_window_store.as_ref(),
            agent_id,
            message_type_str(message.message_type),
            message.content.as_deref(),
            message.target_agent_id.as_deref(),
        )
        .await?;

        if triggered {
            self.record_deny(Some(agent_id), ThreatType::InfiniteLoop, json!({})).await;
            warn!(agent_id, "denying: repeated message loop detected");
            return Ok(Some(InspectionResult::deny("Infinite loop detected", ThreatLevel::Medium)));
        }
        Ok(None)
    }

    async fn check_injection(&self, agent_id: &str, message: &AgentMessage) -> Result<Option<InspectionResult>> {
        let Some(content) = &message.content else { return Ok(None) };
        let detection = PromptInjectionDetector::detect(content);
        if detection.detected {
            let excerpt: String = content.chars().take(200).collect();
            self.record_deny(
                Some(agent_id),
                ThreatType::PromptInjection,
                json!({"excerpt": excerpt, "patterns": detection.patterns}),
            )
            .await;
            warn!(agent_id, confidence = detection.confidence, "denying: prompt injection detected");
            return Ok(Some(InspectionResult::deny("Prompt injection detected", ThreatLevel::Critical)));
        }
        Ok(None)
    }

    async fn check_exfiltration(
        &self,
        agent_id: &str,
        message: &AgentMessage,
    ) -> Result<Option<InspectionResult>> {
        if message.message_type != MessageType::ApiCall {
            return Ok(None);
        }
        let Some(url) = &message.url else { return Ok(None) };
        let body = message.body.as_deref().unwrap_or("");
        let trusted_domains = self.agents.get(agent_id).await?.trusted_domains;

        if clawshield_firewall::ExfiltrationDetector::check(url, body, &trusted_domains) {
            self.record_deny(Some(agent_id), ThreatType::DataExfiltration, json!({"url": url})).await;
            warn!(agent_id, url, "denying: data exfiltration detected");
            return Ok(Some(InspectionResult::deny("Data exfiltration detected", ThreatLevel::Critical)));
        }
        Ok(None)
    }

    /// Runs the Skill Analyzer's full pipeline. Unlike `inspect_*`, this has no
    /// fail-closed contract of its own beyond the bounded risk score, so port failures
    /// propagate as `Err` rather than folding into a deny.
    pub async fn analyze_skill(&self, code: &str, language: &str) -> Result<SkillAnalysisResult> {
        Ok(self.skill_analyzer.analyze(code, language).await?)
    }

    /// Records a Threat Event and, for `Critical` severity, invokes the alert handler.
    /// Failures in either are logged and discarded; they never turn a deny into an
    /// allow, nor do they propagate to the caller.
    async fn record_deny(&self, agent_id: Option<&str>, threat_type: ThreatType, details: Value) {
        let event = ThreatEvent::new(agent_id.unwrap_or(""), threat_type, details);
        let severity = event.severity;

        if let Err(err) = self.threats.record(event.clone()).await {
            warn!(error = %err, "failed to persist threat event");
        }

        if severity == ThreatLevel::Critical {
            if let Some(handler) = &self.alert_handler {
                if let Err(err) = handler.send_alert(&event).await {
                    warn!(error = %err, "alert handler failed");
                }
            }
        }
    }
}

fn message_type_str(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::SessionsSend => "sessions_send",
        MessageType::SessionsSpawn => "sessions_spawn",
        MessageType::SessionsReply => "sessions_reply",
        MessageType::ApiCall => "api_call",
        MessageType::SkillExecute => "skill_execute",
        MessageType::Ping => "ping",
    }
}
