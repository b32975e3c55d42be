use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an imported-but-unconfirmed transaction. Each status is
/// also the name of a pending-store partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnStatus {
    Uncategorized,
    AutoMapped,
    Ignored,
}

impl TxnStatus {
    pub const ALL: [TxnStatus; 3] = [
        TxnStatus::Uncategorized,
        TxnStatus::AutoMapped,
        TxnStatus::Ignored,
    ];
}

impl fmt::Display for TxnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnStatus::Uncategorized => write!(f, "uncategorized"),
            TxnStatus::AutoMapped => write!(f, "auto_mapped"),
            TxnStatus::Ignored => write!(f, "ignored"),
        }
    }
}

/// Provenance of a transaction's category. Variant order is precedence order:
/// an incoming classification may replace the current one only if its source
/// is at least as high (`Manual > Rule > Ai`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    Ai,
    Rule,
    Manual,
}

impl CategorySource {
    /// The single gate consulted before any classification overwrite.
    /// An unclassified transaction (`existing == None`) accepts any source.
    pub fn can_replace(existing: Option<CategorySource>, incoming: CategorySource) -> bool {
        existing.is_none_or(|current| incoming >= current)
    }
}

/// An imported spending record awaiting categorization and confirmation.
///
/// `amount` is always positive (statements report expenses signed; the sign
/// is dropped at import). `matched_rule_id` is set iff the category came from
/// the rule engine. A category without a `category_source` is an import-time
/// heuristic (CSV category column or keyword hit) that no rule or human has
/// confirmed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: TxnStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_source: Option<CategorySource>,
    /// Free-text origin label, e.g. the statement filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PendingTransaction {
    pub fn new(date: NaiveDate, description: &str, amount: Decimal) -> Self {
        debug_assert!(amount > Decimal::ZERO);
        PendingTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            description: description.to_string(),
            amount,
            category: None,
            status: TxnStatus::Uncategorized,
            matched_rule_id: None,
            category_source: None,
            source: None,
            created_at: Utc::now(),
        }
    }

    /// Assign a classification, keeping category / source / rule id coherent:
    /// `rule_id` is retained only for rule-sourced classifications.
    pub fn classify(&mut self, category_id: &str, source: CategorySource, rule_id: Option<&str>) {
        self.category = Some(category_id.to_string());
        self.category_source = Some(source);
        self.matched_rule_id = if source == CategorySource::Rule {
            rule_id.map(str::to_string)
        } else {
            None
        };
    }

    /// Import-time heuristic category — no provenance until the rule engine
    /// or a human confirms it.
    pub fn suggest_category(&mut self, category_id: &str) {
        self.category = Some(category_id.to_string());
        self.category_source = None;
        self.matched_rule_id = None;
    }

    pub fn clear_classification(&mut self) {
        self.category = None;
        self.category_source = None;
        self.matched_rule_id = None;
    }

    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }
}
