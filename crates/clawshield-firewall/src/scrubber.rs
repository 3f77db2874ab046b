//! Response Scrubber: post-proxy inspection of a response's headers and optional body.
//! Reports issues; never mutates or blocks on its own, leaving that decision to
//! callers. Scans outbound credential/header/stack-trace leakage rather than
//! sanitizing content.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrubIssue {
    CredentialLeak(&'static str),
    PermissiveCors,
    MissingContentTypeOptions,
    MissingFrameProtection,
    ServerHeaderDisclosure(String),
    StackTraceLeak,
    InfrastructureErrorLeak(String),
}

struct CredentialPattern {
    label: &'static str,
    regex: Regex,
}

fn credential_patterns() -> &'static Vec<CredentialPattern> {
    static TABLE: OnceLock<Vec<CredentialPattern>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let build = |label: &'static str, pattern: &str| CredentialPattern {
            label,
            regex: Regex::new(pattern).expect("credential pattern must compile"),
        };
        vec![
            build("generic_api_key", r#"(?i)api[_-]?key\s*[:=]\s*['"]?[A-Za-z0-9_\-]{8,}"#),
            build("generic_password", r#"(?i)password\s*[:=]\s*['"]?\S{4,}"#),
            build("generic_secret", r#"(?i)secret\s*[:=]\s*['"]?[A-Za-z0-9_\-]{8,}"#),
            build("generic_token", r#"(?i)token\s*[:=]\s*['"]?[A-Za-z0-9_\-\.]{8,}"#),
            build("aws_access_key", r"AKIA[0-9A-Z]{16}"),
            build("aws_secret_key", r#"(?i)aws_secret_access_key\s*[:=]\s*['"]?[A-Za-z0-9/+=]{40}"#),
            build("stripe_key", r"\b(sk|pk_live|pk_test|rk_live|rk_test)[_-][A-Za-z0-9]{16,}"),
            build("github_token", r"\bgh[pousr]_[A-Za-z0-9]{20,}"),
            build("pem_private_key", r"-----BEGIN [A-Z ]*PRIVATE KEY-----"),
        ]
    })
}

fn stack_trace_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bat\s+\S+\s+\(.*:\d+:\d+\)").expect("stack trace pattern must compile"))
}

fn infra_error_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"ECONNREFUSED|ENOTFOUND|ETIMEDOUT").expect("infra error pattern must compile")
    })
}

const KNOWN_SERVER_PRODUCTS: [&str; 4] = ["nginx", "apache", "iis", "express"];

pub struct ResponseScrubber;

impl ResponseScrubber {
    pub fn scan(status: u16, headers: &HashMap<String, String>, body: Option<&str>) -> Vec<ScrubIssue> {
        let mut issues = Vec::new();

        if let Some(body) = body {
            for pattern in credential_patterns() {
                if pattern.regex.is_match(body) {
                    issues.push(ScrubIssue::CredentialLeak(pattern.label));
                }
            }
        }

        let lower_headers: HashMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();

        if lower_headers
            .get("access-control-allow-origin")
            .is_some_and(|v| v.trim() == "*")
        {
            issues.push(ScrubIssue::PermissiveCors);
        }
        if !lower_headers.contains_key("x-content-type-options") {
            issues.push(ScrubIssue::MissingContentTypeOptions);
        }
        if !lower_headers.contains_key("x-frame-options") && !lower_headers.contains_key("content-security-policy") {
            issues.push(ScrubIssue::MissingFrameProtection);
        }
        if let Some(server) = lower_headers.get("server") {
            let lower = server.to_lowercase();
            if let Some(product) = KNOWN_SERVER_PRODUCTS.iter().find(|p| lower.contains(**p)) {
                issues.push(ScrubIssue::ServerHeaderDisclosure(product.to_string()));
            }
        }

        if status >= 500 {
            if let Some(body) = body {
                if stack_trace_pattern().is_match(body)
                    || (body.to_lowercase().contains("stack") && body.contains("at "))
                {
                    issues.push(ScrubIssue::StackTraceLeak);
                }
                if let Some(m) = infra_error_pattern().find(body) {
                    issues.push(ScrubIssue::InfrastructureErrorLeak(m.as_str().to_string()));
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn clean_response_reports_missing_hardening_headers_only() {
        let issues = ResponseScrubber::scan(200, &HashMap::new(), Some("hello world"));
        assert!(issues.contains(&ScrubIssue::MissingContentTypeOptions));
        assert!(issues.contains(&ScrubIssue::MissingFrameProtection));
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn credential_leak_is_detected() {
        let issues = ResponseScrubber::scan(200, &headers(&[]), Some(r#"{"api_key": "abcdef12345678"}"#));
        assert!(issues.iter().any(|i| matches!(i, ScrubIssue::CredentialLeak(_))));
    }

    #[test]
    fn permissive_cors_is_detected() {
        let issues = ResponseScrubber::scan(
            200,
            &headers(&[("Access-Control-Allow-Origin", "*")]),
            None,
        );
        assert!(issues.contains(&ScrubIssue::PermissiveCors));
    }

    #[test]
    fn server_header_disclosure_is_detected() {
        let issues = ResponseScrubber::scan(200, &headers(&[("Server", "nginx/1.21.0")]), None);
        assert!(issues
            .iter()
            .any(|i| matches!(i, ScrubIssue::ServerHeaderDisclosure(p) if p == "nginx")));
    }

    #[test]
    fn stack_trace_only_checked_on_5xx() {
        let body = "Error\n  at handler (server.js:42:13)";
        let issues_200 = ResponseScrubber::scan(200, &HashMap::new(), Some(body));
        assert!(!issues_200.contains(&ScrubIssue::StackTraceLeak));

        let issues_500 = ResponseScrubber::scan(500, &HashMap::new(), Some(body));
        assert!(issues_500.contains(&ScrubIssue::StackTraceLeak));
    }

    #[test]
    fn infra_error_leak_is_detected_on_5xx() {
        let issues = ResponseScrubber::scan(502, &HashMap::new(), Some("connect ECONNREFUSED 127.0.0.1:5432"));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ScrubIssue::InfrastructureErrorLeak(_))));
    }

    #[test]
    fn present_hardening_headers_suppress_findings() {
        let issues = ResponseScrubber::scan(
            200,
            &headers(&[
                ("X-Content-Type-Options", "nosniff"),
                ("Content-Security-Policy", "default-src 'self'"),
            ]),
            None,
        );
        assert!(issues.is_empty());
    }
}
