use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pending::PendingTransaction;

/// A confirmed, ledger-resident spending record. Append-mostly; updated in
/// place or deleted by id. The id embeds the origin year (`"{year}-{suffix}"`)
/// so the ledger can shard by calendar year without reading the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Category id — never an embedded category.
    pub category: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(amount: Decimal, date: NaiveDate, category: &str, description: &str) -> Self {
        debug_assert!(amount > Decimal::ZERO);
        let now = Utc::now();
        Expense {
            id: format!("{}-{}", date.year(), uuid::Uuid::new_v4()),
            amount,
            date,
            category: category.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the expense a pending transaction confirms into. The id is
    /// derived from the transaction's id, so confirming the same transaction
    /// twice yields the same expense id — a retry after a partial bulk
    /// confirm appends a duplicate id the ledger can collapse, not a second
    /// distinct expense.
    pub fn from_pending(txn: &PendingTransaction, category_id: &str) -> Self {
        let now = Utc::now();
        Expense {
            id: format!("{}-{}", txn.date.year(), txn.id),
            amount: txn.amount,
            date: txn.date,
            category: category_id.to_string(),
            description: txn.description.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Ledger shard year, taken from the date.
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Recover the shard year embedded in an expense id.
    pub fn id_year(id: &str) -> Option<i32> {
        id.split('-').next()?.parse().ok()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
