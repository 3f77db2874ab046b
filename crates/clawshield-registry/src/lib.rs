//! # ClawShield Registry
//!
//! The relational- and key-value-store ports named across `clawshield-firewall`,
//! `clawshield-state`, `clawshield-skills`, and `clawshield-core`, plus a single
//! `sled`-backed [`Storage`] implementing every one of them. Each port trait is
//! defined by its consumer crate (dependency inversion); this crate only supplies the
//! concrete implementation, one `sled::Tree` per namespace.
//!
//! `clawshield-cli` wires one `Arc<Storage>` into the `FirewallOrchestrator`,
//! handing out a clone as `Arc<dyn X>` for each port it satisfies.

mod agents;
mod blacklist;
mod communication_rules;
mod error;
mod loop_window;
mod malware_signatures;
mod rate_limiter;
mod rules;
pub mod sealed_box;
mod skill_verdicts;
mod storage;
mod threats;

pub use error::{RegistryError, Result};
pub use storage::Storage;
