pub mod condition;
pub mod engine;
pub mod rule;

pub use condition::{ConditionField, MatchKind, RuleCondition};
pub use engine::{apply_new_rule, apply_rules, first_match, RulePassSummary};
pub use rule::{
    load_rules_file, load_rules_toml, migrate, LegacyRule, LogicMode, RuleLoadError, StoredRule,
    TransactionRule,
};
