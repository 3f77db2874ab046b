//! The orchestrator's own data model: the `InspectionResult` every pipeline step
//! returns and the `ThreatEvent` every deny records.

use clawshield_firewall::{ThreatLevel, ThreatType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionResult {
    pub allowed: bool,
    pub reason: Option<String>,
    pub threat_level: Option<ThreatLevel>,
    pub threat_score: Option<f64>,
}

impl InspectionResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            threat_level: None,
            threat_score: None,
        }
    }

    pub fn allow_with_score(threat_score: f64) -> Self {
        Self {
            allowed: true,
            reason: None,
            threat_level: None,
            threat_score: Some(threat_score),
        }
    }

    pub fn deny(reason: impl Into<String>, level: ThreatLevel) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            threat_level: Some(level),
            threat_score: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatEvent {
    pub agent_id: String,
    pub threat_type: ThreatType,
    pub severity: ThreatLevel,
    pub details: Value,
    pub resolved: bool,
    pub created_at: u64,
}

impl ThreatEvent {
    pub fn new(agent_id: impl Into<String>, threat_type: ThreatType, details: Value) -> Self {
        Self {
            agent_id: agent_id.into(),
            severity: threat_type.default_severity(),
            threat_type,
            details,
            resolved: false,
            created_at: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
