//! # ClawShield Core
//!
//! `GatewayConfig`, `GatewayError`, the Agent Message schema, and the Firewall
//! Orchestrator facade that wires every leaf capability crate into
//! `inspect_request`/`inspect_message`/`analyze_skill`.

mod config;
mod error;
mod message;
mod models;
mod orchestrator;
mod ports;

pub use config::{FirewallConfig, GatewayConfig, GlobalConfig, RegistryConfig, SkillsConfig};
pub use error::{GatewayError, Result};
pub use message::{validate, AgentMessage, MessageType, StructuralError};
pub use models::{InspectionResult, ThreatEvent};
pub use orchestrator::FirewallOrchestrator;
pub use ports::{AlertHandler, CommunicationRuleStore, ThreatStore};
