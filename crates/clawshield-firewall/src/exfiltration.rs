//! Exfiltration Detector: classifies outbound `api_call` messages by destination trust
//! and payload sensitivity.

use regex::Regex;
use std::sync::OnceLock;

const LARGE_UPLOAD_THRESHOLD: usize = 100_000;

fn sensitive_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(api[_-]?key|apikey)\s*[:=]|password\s*[:=]|secret\s*[:=]|token\s*[:=]|private_key")
            .expect("sensitive pattern must compile")
    })
}

pub struct ExfiltrationDetector;

impl ExfiltrationDetector {
    /// `trusted_domains` holds the agent's configured trusted-domain list, matched
    /// case-insensitively as an exact host or `.<trusted>` suffix.
    pub fn check(url: &str, body: &str, trusted_domains: &[String]) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        if is_trusted(host, trusted_domains) {
            return false;
        }

        if body.len() > LARGE_UPLOAD_THRESHOLD {
            return true;
        }

        sensitive_pattern().is_match(body)
    }
}

fn is_trusted(host: &str, trusted_domains: &[String]) -> bool {
    let host = host.to_lowercase();
    trusted_domains.iter().any(|trusted| {
        let trusted = trusted.to_lowercase();
        host == trusted || host.ends_with(&format!(".{trusted}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_destination_is_never_flagged() {
        let trusted = vec!["example.com".to_string()];
        let big_body = "x".repeat(LARGE_UPLOAD_THRESHOLD + 1);
        assert!(!ExfiltrationDetector::check(
            "https://api.example.com/upload",
            &big_body,
            &trusted
        ));
    }

    #[test]
    fn large_upload_to_untrusted_host_is_flagged() {
        let trusted = vec!["example.com".to_string()];
        let big_body = "x".repeat(LARGE_UPLOAD_THRESHOLD + 1);
        assert!(ExfiltrationDetector::check(
            "https://evil.example.net/upload",
            &big_body,
            &trusted
        ));
    }

    #[test]
    fn sensitive_pattern_to_untrusted_host_is_flagged() {
        let trusted = vec!["example.com".to_string()];
        assert!(ExfiltrationDetector::check(
            "https://evil.example.net/upload",
            "api_key=sk-abcdef1234567890",
            &trusted
        ));
    }

    #[test]
    fn benign_small_body_to_untrusted_host_is_not_flagged() {
        let trusted = vec!["example.com".to_string()];
        assert!(!ExfiltrationDetector::check(
            "https://evil.example.net/upload",
            "hello world",
            &trusted
        ));
    }

    #[test]
    fn unparsable_url_is_benign() {
        let trusted = vec![];
        assert!(!ExfiltrationDetector::check("not a url", "password=hunter2", &trusted));
    }

    #[test]
    fn subdomain_suffix_match_is_trusted() {
        let trusted = vec!["example.com".to_string()];
        assert!(!ExfiltrationDetector::check(
            "https://sub.example.com/upload",
            "password=hunter2",
            &trusted
        ));
    }
}
