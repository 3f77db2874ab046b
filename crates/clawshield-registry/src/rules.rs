//! `sled`-backed `RuleStore`: the read-only, 30s-polled `firewall_rules` table.

use async_trait::async_trait;
use clawshield_firewall::FirewallRule;

use crate::storage::Storage;

impl Storage {
    /// Inserts or overwrites a rule row, keyed by `FirewallRule::id`.
    pub fn put_rule(&self, rule: &FirewallRule) -> crate::error::Result<()> {
        let bytes = serde_json::to_vec(rule)?;
        self.firewall_rules.insert(rule.id.as_bytes(), bytes)?;
        Ok(())
    }
}

#[async_trait]
impl clawshield_firewall::RuleStore for Storage {
    async fn load_enabled_rules(&self) -> clawshield_firewall::Result<Vec<FirewallRule>> {
        let mut rules = Vec::new();
        for entry in self.firewall_rules.iter() {
            let (_, bytes) = entry.map_err(|e| clawshield_firewall::FirewallError::Store(e.to_string()))?;
            let rule: FirewallRule = serde_json::from_slice(&bytes)?;
            if rule.enabled {
                rules.push(rule);
            }
        }
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawshield_firewall::{ActionKind, RuleAction, RuleKind, RuleStore};

    fn sample_rule(id: &str, enabled: bool, priority: i64) -> FirewallRule {
        FirewallRule {
            id: id.to_string(),
            name: format!("rule-{id}"),
            description: String::new(),
            kind: RuleKind::Deny,
            priority,
            enabled,
            conditions: Vec::new(),
            action: RuleAction {
                kind: ActionKind::Deny,
                message: None,
                duration: None,
            },
        }
    }

    #[tokio::test]
    async fn disabled_rules_are_filtered_out() {
        let storage = Storage::temporary().unwrap();
        storage.put_rule(&sample_rule("1", true, 10)).unwrap();
        storage.put_rule(&sample_rule("2", false, 5)).unwrap();

        let loaded = storage.load_enabled_rules().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "1");
    }
}
