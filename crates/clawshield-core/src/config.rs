//! `GatewayConfig`: the nested, TOML-deserializable configuration tree a zero-config
//! gateway already satisfies.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_DYNAMIC_TIMEOUT_MS: u64 = 5000;
const MIN_DYNAMIC_TIMEOUT_MS: u64 = 1000;
const MAX_DYNAMIC_TIMEOUT_MS: u64 = 30000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallConfig {
    pub rate_limit_default_per_minute: u32,
    pub blacklist_ttl_secs: u64,
    pub rule_cache_ttl_secs: u64,
    pub threat_score_threshold: f64,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            rate_limit_default_per_minute: 100,
            blacklist_ttl_secs: 3600,
            rule_cache_ttl_secs: 30,
            threat_score_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    pub dynamic_timeout_ms: u64,
    pub dynamic_memory_cap_bytes: usize,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            dynamic_timeout_ms: DEFAULT_DYNAMIC_TIMEOUT_MS,
            dynamic_memory_cap_bytes: 50 * 1024 * 1024,
        }
    }
}

impl SkillsConfig {
    /// Clamps `dynamic_timeout_ms` to [1000, 30000].
    pub fn clamped_dynamic_timeout_ms(&self) -> u64 {
        self.dynamic_timeout_ms.clamp(MIN_DYNAMIC_TIMEOUT_MS, MAX_DYNAMIC_TIMEOUT_MS)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub fail_closed: bool,
    pub audit_logging: bool,
    pub debug_errors: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            fail_closed: true,
            audit_logging: true,
            debug_errors: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub firewall: FirewallConfig,
    pub skills: SkillsConfig,
    pub registry: RegistryConfig,
    pub global: GlobalConfig,
}
