//! `SkillAnalyzer`: the five-step pipeline that turns a skill's source into a verdict.

use async_trait::async_trait;
use clawshield_firewall::{PromptInjectionDetector, Severity};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::code_hash::code_hash;
use crate::dynamic_analyzer::DynamicAnalyzer;
use crate::error::Result;
use crate::models::{MalwareSignature, SkillAnalysisResult, Vulnerability};
use crate::static_analyzer::StaticAnalyzer;

const STATIC_CRITICAL_REASON: &str = "static analysis found a critical vulnerability";
const INJECTION_REASON: &str = "embedded prompt-injection payload detected";
const DYNAMIC_UNSAFE_REASON: &str = "dynamic analysis observed unsafe behavior";
const INJECTION_CONFIDENCE_THRESHOLD: f64 = 0.7;
const INJECTION_SHORT_CIRCUIT_RISK_SCORE: f64 = 0.9;
const DYNAMIC_UNSAFE_RISK_SCORE: f64 = 0.8;
const INJECTION_SCORE_WEIGHT: f64 = 0.3;
const SAFE_THRESHOLD: f64 = 0.5;

#[async_trait]
pub trait SkillVerdictStore: Send + Sync {
    async fn find_by_hash(&self, code_hash: &str) -> Result<Option<SkillAnalysisResult>>;
    async fn upsert(&self, code_hash: &str, language: &str, result: &SkillAnalysisResult) -> Result<()>;
}

#[async_trait]
pub trait MalwareSignatureStore: Send + Sync {
    async fn load_enabled_signatures(&self) -> Result<Vec<MalwareSignature>>;
}

pub struct SkillAnalyzer {
    verdicts: std::sync::Arc<dyn SkillVerdictStore>,
    signatures: std::sync::Arc<dyn MalwareSignatureStore>,
    dynamic_timeout_ms: Option<u64>,
}

impl SkillAnalyzer {
    pub fn new(
        verdicts: std::sync::Arc<dyn SkillVerdictStore>,
        signatures: std::sync::Arc<dyn MalwareSignatureStore>,
        dynamic_timeout_ms: Option<u64>,
    ) -> Self {
        Self {
            verdicts,
            signatures,
            dynamic_timeout_ms,
        }
    }

    pub async fn analyze(&self, code: &str, language: &str) -> Result<SkillAnalysisResult> {
        let hash = code_hash(code);
        if let Some(cached) = self.verdicts.find_by_hash(&hash).await? {
            debug!(code_hash = %hash, "skill analysis cache hit");
            return Ok(cached);
        }

        let started = Instant::now();
        let mut vulnerabilities: Vec<Vulnerability> = Vec::new();
        let mut patterns: Vec<String> = Vec::new();
        let mut behavior: Option<Vec<String>> = None;
        let mut matched_signature: Option<String> = None;
        let mut reason: Option<String> = None;

        let static_result = StaticAnalyzer::analyze(code);
        vulnerabilities.extend(static_result.vulnerabilities.clone());
        patterns.extend(static_result.patterns.clone());

        if static_result.severity == Severity::Critical {
            let result = self
                .finish(
                    false,
                    1.0,
                    Some(STATIC_CRITICAL_REASON.to_string()),
                    vulnerabilities,
                    patterns,
                    behavior,
                    matched_signature,
                    started,
                );
            self.verdicts.upsert(&hash, language, &result).await?;
            warn!(code_hash = %hash, "skill rejected: critical static vulnerability");
            return Ok(result);
        }

        let injection = PromptInjectionDetector::detect(code);
        if injection.detected && injection.confidence > INJECTION_CONFIDENCE_THRESHOLD {
            patterns.extend(injection.patterns.iter().cloned());
            let result = self.finish(
                false,
                INJECTION_SHORT_CIRCUIT_RISK_SCORE,
                Some(INJECTION_REASON.to_string()),
                vulnerabilities,
                patterns,
                behavior,
                matched_signature,
                started,
            );
            self.verdicts.upsert(&hash, language, &result).await?;
            warn!(code_hash = %hash, "skill rejected: prompt-injection payload detected");
            return Ok(result);
        }

        let dynamic = DynamicAnalyzer::analyze(code, self.dynamic_timeout_ms);
        if !dynamic.unavailable {
            behavior = Some(dynamic.suspicious_behavior.clone());
        }
        if !dynamic.safe {
            behavior = Some(dynamic.suspicious_behavior.clone());
            let result = self.finish(
                false,
                DYNAMIC_UNSAFE_RISK_SCORE,
                Some(DYNAMIC_UNSAFE_REASON.to_string()),
                vulnerabilities,
                patterns,
                behavior,
                matched_signature,
                started,
            );
            self.verdicts.upsert(&hash, language, &result).await?;
            warn!(code_hash = %hash, "skill rejected: unsafe dynamic behavior observed");
            return Ok(result);
        }

        for signature in self.signatures.load_enabled_signatures().await? {
            if signature_matches(&signature, code, &hash) {
                matched_signature = Some(signature.name.clone());
                reason = Some(format!("matched known malware signature '{}'", signature.name));
                break;
            }
        }

        let mut risk_score = static_risk_component(&static_result.severity);
        if injection.detected {
            risk_score += injection.confidence * INJECTION_SCORE_WEIGHT;
        }
        if matched_signature.is_some() {
            risk_score = 1.0;
        }
        let risk_score = risk_score.min(1.0);
        let safe = risk_score < SAFE_THRESHOLD && matched_signature.is_none();

        let result = self.finish(
            safe,
            risk_score,
            reason,
            vulnerabilities,
            patterns,
            behavior,
            matched_signature,
            started,
        );
        self.verdicts.upsert(&hash, language, &result).await?;
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        safe: bool,
        risk_score: f64,
        reason: Option<String>,
        vulnerabilities: Vec<Vulnerability>,
        patterns: Vec<String>,
        behavior: Option<Vec<String>>,
        matched_signature: Option<String>,
        started: Instant,
    ) -> SkillAnalysisResult {
        SkillAnalysisResult {
            safe,
            risk_score,
            reason,
            vulnerabilities,
            patterns,
            behavior,
            matched_signature,
            analysis_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

fn static_risk_component(severity: &Severity) -> f64 {
    match severity {
        Severity::Critical => 0.5,
        Severity::High => 0.3,
        Severity::Medium => 0.15,
        Severity::Low => 0.05,
        Severity::Info => 0.0,
    }
}

fn signature_matches(signature: &MalwareSignature, code: &str, hash: &str) -> bool {
    if let Some(expected_hash) = &signature.content_hash {
        if expected_hash.eq_ignore_ascii_case(hash) {
            return true;
        }
    }
    if let Some(pattern) = &signature.pattern {
        if let Ok(re) = regex::Regex::new(pattern) {
            return re.is_match(code);
        }
    }
    false
}
