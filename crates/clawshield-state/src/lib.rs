//! # ClawShield State
//!
//! In-process runtime state the firewall orchestrator owns exclusively: the Agent
//! Context registry, the rate limiter, the blacklist, and the Loop Detector's rolling
//! message window. Every port here is defined by its consumer (this crate) and
//! satisfied by a sled-backed implementation in `clawshield-registry`, so this crate
//! never depends on a persistence implementation directly.

mod blacklist;
mod context;
mod error;
mod loop_detector;
mod rate_limiter;

pub use blacklist::{BlacklistStore, InMemoryBlacklist, DEFAULT_BLACKLIST_TTL};
pub use context::{
    AgentContext, AgentContextPatch, AgentContextRegistry, AgentStatus, AgentStore, Permission,
    PersistedAgent,
};
pub use error::{Result, StateError};
pub use loop_detector::{
    fingerprint, InMemoryLoopWindowStore, LoopDetector, LoopWindowStore, LOOP_TRIGGER_THRESHOLD,
    WINDOW_MAX_LEN, WINDOW_TTL,
};
pub use rate_limiter::{exceeds_cap, InMemoryRateLimiter, RateLimiter, RATE_LIMIT_WINDOW};
