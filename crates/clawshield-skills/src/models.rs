//! Shared vocabulary for the Skill Analyzer's three stages.

use clawshield_firewall::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityKind {
    DangerousFunction,
    DangerousModule,
    FilesystemAccess,
    NetworkRequest,
    SandboxEscape,
    DynamicImport,
    EnvAccess,
    Obfuscation,
    ParseError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub kind: VulnerabilityKind,
    pub severity: Severity,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticAnalysisResult {
    pub vulnerabilities: Vec<Vulnerability>,
    pub severity: Severity,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicAnalysisResult {
    pub safe: bool,
    pub suspicious_behavior: Vec<String>,
    pub execution_time_ms: u64,
    pub memory_used: usize,
    pub network_attempts: Vec<String>,
    pub fs_attempts: Vec<String>,
    /// Set when no workable in-process script engine was available and the stage
    /// degraded to "static only".
    pub unavailable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillAnalysisResult {
    pub safe: bool,
    pub risk_score: f64,
    pub reason: Option<String>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub patterns: Vec<String>,
    pub behavior: Option<Vec<String>>,
    pub matched_signature: Option<String>,
    pub analysis_duration_ms: f64,
}

/// A configured malware signature. A signature matches iff the hash equals the
/// SHA-256 of the candidate code, or the (optional) pattern regex matches; an invalid
/// pattern is skipped rather than erroring the whole scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalwareSignature {
    pub id: String,
    pub name: String,
    pub content_hash: Option<String>,
    pub pattern: Option<String>,
    pub severity: Severity,
    pub description: String,
}

/// A persisted `analyzed_skills` row, upserted by `code_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedSkillRow {
    pub code_hash: String,
    pub language: String,
    pub safe: bool,
    pub risk_score: f64,
    pub reason: Option<String>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub patterns: Vec<String>,
    pub analysis_time_ms: f64,
}
