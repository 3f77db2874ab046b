use thiserror::Error;

/// Aggregates every port-call failure the orchestrator can observe. Never returned
/// from `inspect_request`/`inspect_message` themselves: those fold any `GatewayError`
/// into the fail-closed `InspectionResult` before returning.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Firewall(#[from] clawshield_firewall::FirewallError),

    #[error(transparent)]
    State(#[from] clawshield_state::StateError),

    #[error(transparent)]
    Skill(#[from] clawshield_skills::SkillError),

    #[error("persistence lookup failed: {0}")]
    Store(String),

    #[error("request deadline exceeded")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, GatewayError>;
