//! Rule Engine: an ordered, cached list of declarative conditions evaluated against a
//! field-addressable context. Loads once, refreshes on a fixed TTL, and serves a
//! snapshot to every concurrent reader.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Result;
use crate::models::ThreatLevel;

pub const RULE_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Allow,
    Deny,
    Conditional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Neq,
    Contains,
    Regex,
    Gt,
    Lt,
    In,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

impl ConditionValue {
    fn as_text(&self) -> String {
        match self {
            ConditionValue::Text(s) => s.clone(),
            ConditionValue::Number(n) => n.to_string(),
            ConditionValue::List(items) => items.join(","),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Allow,
    Deny,
    Log,
    Alert,
    Quarantine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleAction {
    pub kind: ActionKind,
    pub message: Option<String>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: RuleKind,
    pub priority: i64,
    pub enabled: bool,
    pub conditions: Vec<RuleCondition>,
    pub action: RuleAction,
}

/// The outcome of evaluating the rule set against one context. `Deny`/`Allow` are
/// terminal; `Continue` means no rule matched terminally (or only `conditional` rules
/// matched, which are logged but never decide).
#[derive(Debug, Clone, PartialEq)]
pub enum RuleVerdict {
    Allow,
    Deny {
        rule_name: String,
        reason: String,
        level: ThreatLevel,
    },
    Continue,
}

/// Port the Rule Engine consumes to load the persisted, enabled rule set. Implemented
/// by `clawshield-registry`'s sled-backed store in production, and by an in-memory
/// `Vec<FirewallRule>` wrapper in tests.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn load_enabled_rules(&self) -> Result<Vec<FirewallRule>>;
}

struct CachedRules {
    rules: Vec<FirewallRule>,
    fetched_at: Instant,
}

pub struct RuleEngine {
    store: Arc<dyn RuleStore>,
    cache: RwLock<Option<CachedRules>>,
    warned_regex: RwLock<std::collections::HashSet<String>>,
}

impl RuleEngine {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(None),
            warned_regex: RwLock::new(std::collections::HashSet::new()),
        }
    }

    /// Returns a fresh snapshot of the ascending-priority, enabled rule set, refreshing
    /// from the store if the cache is empty or older than [`RULE_CACHE_TTL`].
    async fn snapshot(&self) -> Result<Vec<FirewallRule>> {
        {
            let guard = self.cache.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < RULE_CACHE_TTL {
                    return Ok(cached.rules.clone());
                }
            }
        }
        let mut rules = self.store.load_enabled_rules().await?;
        rules.sort_by_key(|r| r.priority);
        let mut guard = self.cache.write().await;
        *guard = Some(CachedRules {
            rules: rules.clone(),
            fetched_at: Instant::now(),
        });
        Ok(rules)
    }

    /// Evaluates the cached rule set against `context`, in ascending priority order.
    pub async fn evaluate(&self, context: &HashMap<String, Value>) -> Result<RuleVerdict> {
        let rules = self.snapshot().await?;
        for rule in &rules {
            if !rule.enabled {
                continue;
            }
            if self.conditions_match(rule, context).await {
                match rule.kind {
                    RuleKind::Deny => {
                        let reason = rule
                            .action
                            .message
                            .clone()
                            .unwrap_or_else(|| format!("Blocked by rule: {}", rule.name));
                        return Ok(RuleVerdict::Deny {
                            rule_name: rule.name.clone(),
                            reason,
                            level: ThreatLevel::Medium,
                        });
                    }
                    RuleKind::Allow => return Ok(RuleVerdict::Allow),
                    RuleKind::Conditional => {
                        tracing::debug!(rule = %rule.name, "conditional rule matched, continuing evaluation");
                    }
                }
            }
        }
        Ok(RuleVerdict::Continue)
    }

    async fn conditions_match(&self, rule: &FirewallRule, context: &HashMap<String, Value>) -> bool {
        for condition in &rule.conditions {
            if !self.condition_matches(rule, condition, context).await {
                return false;
            }
        }
        true
    }

    async fn condition_matches(
        &self,
        rule: &FirewallRule,
        condition: &RuleCondition,
        context: &HashMap<String, Value>,
    ) -> bool {
        let resolved = resolve_field(context, &condition.field);
        let Some(actual) = resolved else {
            return false;
        };
        let actual_text = value_to_text(&actual);

        match condition.operator {
            Operator::Eq => actual_text == condition.value.as_text(),
            Operator::Neq => actual_text != condition.value.as_text(),
            Operator::Contains => actual_text.contains(&condition.value.as_text()),
            Operator::Regex => {
                let pattern = condition.value.as_text();
                match Regex::new(&format!("(?i){pattern}")) {
                    Ok(re) => re.is_match(&actual_text),
                    Err(_) => {
                        let key = format!("{}:{}", rule.id, pattern);
                        let mut warned = self.warned_regex.write().await;
                        if warned.insert(key) {
                            warn!(rule = %rule.name, %pattern, "invalid regex in rule condition, treating as no-match");
                        }
                        false
                    }
                }
            }
            Operator::Gt => match (actual_text.parse::<f64>(), condition.value.as_text().parse::<f64>()) {
                (Ok(a), Ok(b)) => a > b,
                _ => false,
            },
            Operator::Lt => match (actual_text.parse::<f64>(), condition.value.as_text().parse::<f64>()) {
                (Ok(a), Ok(b)) => a < b,
                _ => false,
            },
            Operator::In => match &condition.value {
                ConditionValue::List(items) => items.iter().any(|item| item == &actual_text),
                _ => false,
            },
        }
    }
}

/// Dotted-path lookup over the evaluation context. `a.b.c` walks nested JSON objects;
/// an absent path at any level resolves to `None`, never matching.
fn resolve_field(context: &HashMap<String, Value>, path: &str) -> Option<Value> {
    let mut parts = path.split('.');
    let head = parts.next()?;
    let mut current = context.get(head)?.clone();
    for part in parts {
        current = current.get(part)?.clone();
    }
    Some(current)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "undefined".to_string(),
        other => other.to_string(),
    }
}
