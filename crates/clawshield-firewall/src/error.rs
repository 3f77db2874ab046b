use thiserror::Error;

/// Errors raised by the firewall's pure, synchronous components.
///
/// None of these ever need to cross an inspection boundary as an `Err` the way
/// [`crate::rule::RuleStore`] failures do; they exist so a caller can distinguish
/// "no match" from "this pattern table entry is broken" when building the once-per-rule
/// logging named in the rule engine's invalid-regex behavior.
#[derive(Debug, Error)]
pub enum FirewallError {
    #[error("invalid regex in rule condition: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("malformed rule action: {0}")]
    MalformedAction(String),

    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("persistence lookup failed: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, FirewallError>;
