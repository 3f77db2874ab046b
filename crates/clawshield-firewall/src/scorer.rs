//! Threat Scorer: a stateless, composite-risk scorer over a fixed table of weighted
//! patterns plus a handful of rate/size anomaly factors. Scores compose multiplicatively
//! against the remaining headroom rather than summing, so no combination of factors can
//! push the result past 1.0.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One entry of the fixed pattern table: a label, a weight, and the compiled pattern.
struct WeightedPattern {
    label: &'static str,
    weight: f64,
    regex: Regex,
}

fn pattern_table() -> &'static Vec<WeightedPattern> {
    static TABLE: OnceLock<Vec<WeightedPattern>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let build = |label: &'static str, weight: f64, pattern: &str| WeightedPattern {
            label,
            weight,
            regex: Regex::new(pattern).expect("static pattern table entry must compile"),
        };
        vec![
            build("path_traversal", 0.3, r"\.\./"),
            build("xss_attempt", 0.4, r"(?i)<script[^>]*>"),
            build("sql_injection", 0.5, r"(?i)union\s+select"),
            build("sql_drop", 0.9, r"(?i);\s*drop\s+table"),
            build("template_injection", 0.3, r"\$\{.*\}"),
            build("env_access", 0.4, r"(?i)process\.env"),
            build("command_exec", 0.6, r"(?i)child_process"),
            build(
                "require_child_process",
                0.8,
                r#"(?i)require\s*\(\s*['"]child_process['"]\s*\)"#,
            ),
            build("exec_call", 0.5, r"(?i)exec\s*\("),
        ]
    })
}

const SUSPICIOUS_HEADERS: [&str; 3] = ["x-forwarded-host", "x-original-url", "x-rewrite-url"];
const SUSPICIOUS_HEADER_WEIGHT: f64 = 0.2;
const RATE_ANOMALY_WEIGHT: f64 = 0.3;
const LARGE_PAYLOAD_WEIGHT: f64 = 0.2;
const LARGE_PAYLOAD_THRESHOLD: usize = 500_000;
const RATE_ANOMALY_REQUEST_COUNT: u64 = 50;
const RATE_ANOMALY_WINDOW_MS: u64 = 1000;

/// Inputs the scorer needs beyond the raw body/path, including `requestCount` from the
/// agent's context.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext<'a> {
    pub body: &'a str,
    pub path: &'a str,
    pub headers: &'a HashMap<String, String>,
    pub request_count: u64,
    pub time_since_last_request_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub score: f64,
    pub factors: Vec<(String, f64)>,
}

pub struct ThreatScorer;

impl ThreatScorer {
    pub fn score(ctx: &ScoringContext<'_>) -> ScoreResult {
        let mut score = 0.0_f64;
        let mut factors = Vec::new();

        let mut apply = |label: String, weight: f64, score: &mut f64| {
            *score += weight * (1.0 - *score);
            factors.push((label, weight));
        };

        for pattern in pattern_table() {
            if pattern.regex.is_match(ctx.body) {
                apply(pattern.label.to_string(), pattern.weight, &mut score);
            }
            if pattern.regex.is_match(ctx.path) {
                apply(format!("path_{}", pattern.label), pattern.weight, &mut score);
            }
        }

        if ctx
            .headers
            .keys()
            .any(|h| SUSPICIOUS_HEADERS.contains(&h.to_lowercase().as_str()))
        {
            apply("suspicious_header".to_string(), SUSPICIOUS_HEADER_WEIGHT, &mut score);
        }

        if ctx.request_count > RATE_ANOMALY_REQUEST_COUNT
            && ctx
                .time_since_last_request_ms
                .is_some_and(|d| d < RATE_ANOMALY_WINDOW_MS)
        {
            apply("rate_anomaly".to_string(), RATE_ANOMALY_WEIGHT, &mut score);
        }

        if ctx.body.len() > LARGE_PAYLOAD_THRESHOLD {
            apply("large_payload".to_string(), LARGE_PAYLOAD_WEIGHT, &mut score);
        }

        ScoreResult { score, factors }
    }
}
