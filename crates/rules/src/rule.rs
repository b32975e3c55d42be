use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::condition::{MatchKind, RuleCondition};

/// AND/OR combination of a rule's conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicMode {
    #[default]
    All,
    Any,
}

/// A named, ordered set of conditions that assigns a category when matched.
/// Rules are evaluated in list order and the first enabled match wins —
/// there is no priority field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRule {
    pub id: String,
    pub name: String,
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub logic_mode: LogicMode,
    pub category_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl TransactionRule {
    pub fn new(name: &str, category_id: &str, conditions: Vec<RuleCondition>) -> Self {
        TransactionRule {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            conditions,
            logic_mode: LogicMode::All,
            category_id: category_id.to_string(),
            enabled: true,
            created_at: Utc::now(),
        }
    }

    /// A disabled rule, or one with no conditions, never matches.
    pub fn matches(&self, description: &str, amount: Decimal) -> bool {
        if !self.enabled || self.conditions.is_empty() {
            return false;
        }
        match self.logic_mode {
            LogicMode::All => self.conditions.iter().all(|c| c.matches(description, amount)),
            LogicMode::Any => self.conditions.iter().any(|c| c.matches(description, amount)),
        }
    }
}

/// A rule as it appears in storage: the modern multi-condition shape or the
/// legacy single-pattern shape. Legacy rules are migrated once at load time;
/// evaluation sites only ever see `TransactionRule`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredRule {
    Modern(TransactionRule),
    Legacy(LegacyRule),
}

/// The old rule shape: one pattern, implicitly a case-insensitive
/// description `contains`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRule {
    pub id: String,
    pub name: String,
    pub pattern: String,
    pub category_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Convert a stored rule to the modern shape.
pub fn migrate(stored: StoredRule) -> TransactionRule {
    match stored {
        StoredRule::Modern(rule) => rule,
        StoredRule::Legacy(legacy) => TransactionRule {
            id: legacy.id,
            name: legacy.name,
            conditions: vec![RuleCondition::description(MatchKind::Contains, &legacy.pattern)],
            logic_mode: LogicMode::All,
            category_id: legacy.category_id,
            enabled: legacy.enabled,
            created_at: Utc::now(),
        },
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rule: Vec<StoredRule>,
}

#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rule TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Parse a TOML rule document, migrating legacy entries:
///
/// ```toml
/// [[rule]]
/// id = "r-groceries"
/// name = "Groceries"
/// category_id = "groceries"
/// logic_mode = "all"
///
/// [[rule.conditions]]
/// field = "description"
/// match_kind = "contains"
/// value = "trader"
/// ```
pub fn load_rules_toml(content: &str) -> Result<Vec<TransactionRule>, RuleLoadError> {
    let file: RuleFile = toml::from_str(content)?;
    Ok(file.rule.into_iter().map(migrate).collect())
}

pub fn load_rules_file(path: &Path) -> Result<Vec<TransactionRule>, RuleLoadError> {
    load_rules_toml(&std::fs::read_to_string(path)?)
}
