//! # ClawShield Firewall
//!
//! The pattern-matching and policy-evaluation heart of the gateway: a Rule Engine, a
//! Threat Scorer, a Prompt-Injection Detector, an Exfiltration Detector, and a Response
//! Scrubber. Every component here is synchronous and side-effect free except the Rule
//! Engine's cache, which only ever talks to the world through the [`rule::RuleStore`]
//! port it is handed.
//!
//! ## Threat Coverage
//!
//! | Component | Defends against |
//! |-----------|------------------|
//! | Rule Engine | Declarative allow/deny policy over method, path, body, headers |
//! | Threat Scorer | Known exploit patterns (traversal, XSS, SQLi, template injection) |
//! | Prompt-Injection Detector | Signature-and-heuristic jailbreak/override attempts |
//! | Exfiltration Detector | Large or credential-bearing uploads to untrusted hosts |
//! | Response Scrubber | Leaked credentials, missing hardening headers, stack traces |
//!
//! ## References
//!
//! - OWASP Top 10 for LLM Applications: <https://owasp.org/www-project-top-10-for-large-language-model-applications/>

mod error;
mod exfiltration;
mod injection;
pub mod models;
mod rule;
mod scorer;
mod scrubber;

pub use error::{FirewallError, Result};
pub use exfiltration::ExfiltrationDetector;
pub use injection::{DetectionResult, PromptInjectionDetector};
pub use models::{Severity, ThreatLevel, ThreatType};
pub use rule::{
    ActionKind, ConditionValue, FirewallRule, Operator, RuleAction, RuleCondition, RuleEngine, RuleKind,
    RuleStore, RuleVerdict, RULE_CACHE_TTL,
};
pub use scorer::{ScoreResult, ScoringContext, ThreatScorer};
pub use scrubber::{ResponseScrubber, ScrubIssue};
