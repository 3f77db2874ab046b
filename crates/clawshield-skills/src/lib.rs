//! Skill Analyzer: inspects third-party agent skills before they run, combining a
//! static AST scan, reuse of the firewall's prompt-injection detector, a sandboxed
//! dynamic execution pass, and known-malware signature matching into one verdict.

mod analyzer;
mod code_hash;
mod dynamic_analyzer;
mod error;
mod models;
mod static_analyzer;

pub use analyzer::{MalwareSignatureStore, SkillAnalyzer, SkillVerdictStore};
pub use code_hash::code_hash as get_code_hash;
pub use dynamic_analyzer::DynamicAnalyzer;
pub use error::{Result, SkillError};
pub use models::{
    AnalyzedSkillRow, DynamicAnalysisResult, MalwareSignature, SkillAnalysisResult,
    StaticAnalysisResult, Vulnerability, VulnerabilityKind,
};
pub use static_analyzer::StaticAnalyzer;
