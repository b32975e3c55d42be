use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which transaction field a condition inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    Description,
    Amount,
}

/// How a condition compares its value against the field. The text kinds
/// pair with `Description`, the numeric kinds with `Amount`; a mismatched
/// pairing simply never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Contains,
    StartsWith,
    EndsWith,
    Equals,
    GreaterThan,
    LessThan,
    Between,
}

/// A single predicate over a transaction's description or amount. Values are
/// stored as strings (they come from user input); a numeric value that fails
/// to parse makes the condition evaluate false — conditions never error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    #[serde(default = "new_condition_id")]
    pub id: String,
    pub field: ConditionField,
    pub match_kind: MatchKind,
    pub value: String,
    /// Second bound, only for `Between`; bound order is not significant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
}

fn new_condition_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Float-safe tolerance for amount equality.
fn equality_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

impl RuleCondition {
    pub fn description(match_kind: MatchKind, value: &str) -> Self {
        RuleCondition {
            id: new_condition_id(),
            field: ConditionField::Description,
            match_kind,
            value: value.to_string(),
            value2: None,
        }
    }

    pub fn amount(match_kind: MatchKind, value: &str) -> Self {
        RuleCondition {
            id: new_condition_id(),
            field: ConditionField::Amount,
            match_kind,
            value: value.to_string(),
            value2: None,
        }
    }

    pub fn between(low: &str, high: &str) -> Self {
        RuleCondition {
            id: new_condition_id(),
            field: ConditionField::Amount,
            match_kind: MatchKind::Between,
            value: low.to_string(),
            value2: Some(high.to_string()),
        }
    }

    /// Evaluate against a transaction's description and amount.
    pub fn matches(&self, description: &str, amount: Decimal) -> bool {
        match self.field {
            ConditionField::Description => self.matches_text(description),
            ConditionField::Amount => self.matches_amount(amount),
        }
    }

    fn matches_text(&self, description: &str) -> bool {
        let haystack = description.to_lowercase();
        let needle = self.value.to_lowercase();
        match self.match_kind {
            MatchKind::Contains => haystack.contains(&needle),
            MatchKind::StartsWith => haystack.starts_with(&needle),
            MatchKind::EndsWith => haystack.ends_with(&needle),
            MatchKind::Equals => haystack == needle,
            _ => false,
        }
    }

    fn matches_amount(&self, amount: Decimal) -> bool {
        let Some(value) = parse_bound(&self.value) else {
            return false;
        };
        match self.match_kind {
            MatchKind::Equals => (amount - value).abs() < equality_tolerance(),
            MatchKind::GreaterThan => amount > value,
            MatchKind::LessThan => amount < value,
            MatchKind::Between => {
                let Some(other) = self.value2.as_deref().and_then(parse_bound) else {
                    return false;
                };
                let (lo, hi) = if value <= other { (value, other) } else { (other, value) };
                amount >= lo && amount <= hi
            }
            _ => false,
        }
    }
}

fn parse_bound(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}
