//! `Storage`: a single `sled::Db` wrapping one `sled::Tree` per logical table or
//! key-value family.
//!
//! Every port trait this crate satisfies (`RuleStore`, `AgentStore`, `RateLimiter`,
//! `BlacklistStore`, `LoopWindowStore`, `CommunicationRuleStore`, `ThreatStore`,
//! `SkillVerdictStore`, `MalwareSignatureStore`) is implemented directly on `Storage`
//! rather than on a proliferation of single-purpose wrapper types.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

const AGENTS: &str = "agents";
const COMMUNICATION_RULES: &str = "agent_communication_rules";
const FIREWALL_RULES: &str = "firewall_rules";
const THREATS: &str = "threats";
const ANALYZED_SKILLS: &str = "analyzed_skills";
const MALWARE_SIGNATURES: &str = "malware_signatures";
const RATELIMIT: &str = "agent_ratelimit";
const BLACKLIST: &str = "agent_blacklist";
const MESSAGES: &str = "agent_messages";
const BAD_IPS: &str = "threat_bad_ips";
const BAD_DOMAINS: &str = "threat_bad_domains";
const KEYS: &str = "keys";
const THREAT_DETAILS_KEY: &[u8] = b"threat_details_key";

#[derive(Clone)]
pub struct Storage {
    #[allow(dead_code)]
    db: sled::Db,
    pub(crate) agents: sled::Tree,
    pub(crate) communication_rules: sled::Tree,
    pub(crate) firewall_rules: sled::Tree,
    pub(crate) threats: sled::Tree,
    pub(crate) analyzed_skills: sled::Tree,
    pub(crate) malware_signatures: sled::Tree,
    pub(crate) ratelimit: sled::Tree,
    pub(crate) blacklist: sled::Tree,
    pub(crate) messages: sled::Tree,
    pub(crate) bad_ips: sled::Tree,
    pub(crate) bad_domains: sled::Tree,
    pub(crate) keys: sled::Tree,
}

impl Storage {
    /// Opens (creating if absent) a durable, on-disk registry at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// An in-memory registry for tests; data is lost when the returned `Storage` is
    /// dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        Ok(Self {
            agents: db.open_tree(AGENTS)?,
            communication_rules: db.open_tree(COMMUNICATION_RULES)?,
            firewall_rules: db.open_tree(FIREWALL_RULES)?,
            threats: db.open_tree(THREATS)?,
            analyzed_skills: db.open_tree(ANALYZED_SKILLS)?,
            malware_signatures: db.open_tree(MALWARE_SIGNATURES)?,
            ratelimit: db.open_tree(RATELIMIT)?,
            blacklist: db.open_tree(BLACKLIST)?,
            messages: db.open_tree(MESSAGES)?,
            bad_ips: db.open_tree(BAD_IPS)?,
            bad_domains: db.open_tree(BAD_DOMAINS)?,
            keys: db.open_tree(KEYS)?,
            db,
        })
    }

    /// Returns the key used to seal `ThreatEvent::details` at rest, generating and
    /// persisting one in the `keys` tree on first use.
    pub(crate) fn threat_details_key(&self) -> Result<[u8; 32]> {
        if let Some(bytes) = self.keys.get(THREAT_DETAILS_KEY)? {
            let key: [u8; 32] = bytes
                .as_ref()
                .try_into()
                .map_err(|_| crate::error::RegistryError::Crypto("stored key has wrong length".to_string()))?;
            return Ok(key);
        }
        let mut key = [0u8; 32];
        use rand::RngCore;
        rand::thread_rng().fill_bytes(&mut key);
        self.keys.insert(THREAT_DETAILS_KEY, &key)?;
        Ok(key)
    }

    /// Records an IP on the persistent, admin-managed threat-intel set. Not yet
    /// consulted by any pipeline stage.
    pub fn add_bad_ip(&self, ip: &str) -> Result<()> {
        self.bad_ips.insert(ip.as_bytes(), &[1u8])?;
        Ok(())
    }

    pub fn is_bad_ip(&self, ip: &str) -> Result<bool> {
        Ok(self.bad_ips.contains_key(ip.as_bytes())?)
    }

    /// Records a domain on the persistent, admin-managed threat-intel set. Not yet
    /// consulted by any pipeline stage.
    pub fn add_bad_domain(&self, domain: &str) -> Result<()> {
        self.bad_domains.insert(domain.as_bytes(), &[1u8])?;
        Ok(())
    }

    pub fn is_bad_domain(&self, domain: &str) -> Result<bool> {
        Ok(self.bad_domains.contains_key(domain.as_bytes())?)
    }
}

/// Milliseconds since the epoch, used to stamp TTL expiry alongside key-value rows so
/// an expired read can be treated as absent without a background sweep.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
