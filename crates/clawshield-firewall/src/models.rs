//! Shared vocabulary used across the inspection pipeline: threat levels, threat types,
//! and the severity scale the skill analyzer's static stage reports against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse severity attached to an `InspectionResult` or a `ThreatEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
            ThreatLevel::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The enumerated threat type recorded on a `ThreatEvent`. Each variant has a fixed
/// severity mapping, used both for the default threat-event severity and for
/// alert-handler dispatch (critical only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    RuleViolation,
    HighThreatScore,
    PromptInjection,
    DataExfiltration,
    UnauthorizedAgentCommunication,
    InfiniteLoop,
    RateLimitExceeded,
    MalwareDetected,
    CredentialLeak,
    WebsocketAbuse,
}

impl ThreatType {
    /// Fixed severity mapping used whenever a caller doesn't supply a more specific
    /// level (e.g. the rule engine's own `deny` actions can override this).
    pub fn default_severity(self) -> ThreatLevel {
        match self {
            ThreatType::RuleViolation => ThreatLevel::Medium,
            ThreatType::HighThreatScore => ThreatLevel::High,
            ThreatType::PromptInjection => ThreatLevel::Critical,
            ThreatType::DataExfiltration => ThreatLevel::Critical,
            ThreatType::UnauthorizedAgentCommunication => ThreatLevel::High,
            ThreatType::InfiniteLoop => ThreatLevel::Medium,
            ThreatType::RateLimitExceeded => ThreatLevel::Low,
            ThreatType::MalwareDetected => ThreatLevel::Critical,
            ThreatType::CredentialLeak => ThreatLevel::Critical,
            ThreatType::WebsocketAbuse => ThreatLevel::Medium,
        }
    }
}

/// Severity scale for individual static-analysis vulnerabilities. Ordered so that
/// `Critical > High > Medium > Low > Info`, matching the "max of reported severities"
/// rule the static analyzer's overall verdict is defined by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight contributed to the skill analyzer's fused risk score.
    pub fn risk_weight(self) -> f64 {
        match self {
            Severity::Critical => 0.5,
            Severity::High => 0.3,
            Severity::Medium => 0.15,
            Severity::Low => 0.05,
            Severity::Info => 0.0,
        }
    }
}
