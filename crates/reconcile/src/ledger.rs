use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

use outlay_core::Expense;

use crate::error::ReconcileError;
use crate::store::{Partition, RecordStore};

/// An expense as submitted by a caller (e.g. a confirm form). Fields are
/// optional so a whole batch can be validated up front instead of failing
/// midway through the writes.
#[derive(Debug, Clone, Default)]
pub struct ExpenseDraft {
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub description: String,
}

/// Validate the whole batch, then append year-grouped. Nothing is written
/// when any entry is missing a date or category or lacks a positive amount —
/// the error enumerates the offending indices.
pub fn append_batch<S: RecordStore>(
    store: &mut S,
    drafts: &[ExpenseDraft],
) -> Result<Vec<Expense>, ReconcileError> {
    let mut invalid = Vec::new();
    let mut expenses = Vec::new();
    for (i, draft) in drafts.iter().enumerate() {
        match (draft.amount, draft.date, draft.category.as_deref()) {
            (Some(amount), Some(date), Some(category))
                if amount > Decimal::ZERO && !category.trim().is_empty() =>
            {
                expenses.push(Expense::new(amount, date, category, &draft.description));
            }
            _ => invalid.push(i),
        }
    }
    if !invalid.is_empty() {
        return Err(ReconcileError::InvalidEntries(invalid));
    }
    append_expenses(store, &expenses)?;
    Ok(expenses)
}

/// Append already-built expenses, grouped into one store call per year.
pub(crate) fn append_expenses<S: RecordStore>(
    store: &mut S,
    expenses: &[Expense],
) -> Result<(), ReconcileError> {
    let mut by_year: BTreeMap<i32, Vec<Value>> = BTreeMap::new();
    for expense in expenses {
        by_year.entry(expense.year()).or_default().push(serde_json::to_value(expense)?);
    }
    for (year, rows) in by_year {
        store.append_rows(&Partition::Ledger(year), rows)?;
    }
    Ok(())
}

pub fn add_expense<S: RecordStore>(
    store: &mut S,
    amount: Decimal,
    date: NaiveDate,
    category: &str,
    description: &str,
) -> Result<Expense, ReconcileError> {
    let expense = Expense::new(amount, date, category, description);
    append_expenses(store, std::slice::from_ref(&expense))?;
    Ok(expense)
}

/// Update in place by id. The shard year comes from the id, so an edited
/// date within the same year stays put; the caller is responsible for not
/// moving an expense across years.
pub fn update_expense<S: RecordStore>(
    store: &mut S,
    expense: &mut Expense,
) -> Result<(), ReconcileError> {
    expense.touch();
    let year = Expense::id_year(&expense.id).unwrap_or_else(|| expense.year());
    let row = serde_json::to_value(&*expense)?;
    store.update_row(&Partition::Ledger(year), &expense.id, row)?;
    Ok(())
}

pub fn delete_expense<S: RecordStore>(store: &mut S, id: &str) -> Result<(), ReconcileError> {
    let year = Expense::id_year(id).ok_or_else(|| ReconcileError::NotFound(id.to_string()))?;
    store.delete_row(&Partition::Ledger(year), id)?;
    Ok(())
}

pub fn expenses_for_year<S: RecordStore>(store: &S, year: i32) -> Result<Vec<Expense>, ReconcileError> {
    store
        .get_rows(&Partition::Ledger(year))?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(amount: i64, y: i32, category: &str, description: &str) -> ExpenseDraft {
        ExpenseDraft {
            amount: Some(Decimal::new(amount, 2)),
            date: Some(date(y, 5, 10)),
            category: Some(category.to_string()),
            description: description.to_string(),
        }
    }

    #[test]
    fn append_batch_shards_by_year() {
        let mut store = MemoryStore::new();
        let drafts = vec![
            draft(1000, 2023, "misc", "late 2023"),
            draft(2000, 2024, "misc", "one"),
            draft(3000, 2024, "misc", "two"),
        ];
        let expenses = append_batch(&mut store, &drafts).unwrap();
        assert_eq!(expenses.len(), 3);
        assert_eq!(store.partition_len(&Partition::Ledger(2023)), 1);
        assert_eq!(store.partition_len(&Partition::Ledger(2024)), 2);
    }

    #[test]
    fn append_batch_rejects_invalid_entries_before_writing() {
        let mut store = MemoryStore::new();
        let drafts = vec![
            draft(1000, 2024, "misc", "fine"),
            ExpenseDraft { category: None, ..draft(1000, 2024, "misc", "no category") },
            ExpenseDraft { date: None, ..draft(1000, 2024, "misc", "no date") },
            ExpenseDraft { amount: Some(Decimal::ZERO), ..draft(0, 2024, "misc", "zero") },
        ];
        let err = append_batch(&mut store, &drafts).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidEntries(ref idx) if *idx == vec![1, 2, 3]));
        // Whole batch aborted — even the valid first entry was not written.
        assert_eq!(store.partition_len(&Partition::Ledger(2024)), 0);
    }

    #[test]
    fn update_expense_rewrites_in_place() {
        let mut store = MemoryStore::new();
        let mut expense =
            add_expense(&mut store, Decimal::new(4520, 2), date(2024, 3, 1), "groceries", "TJ").unwrap();
        expense.category = "dining".to_string();
        update_expense(&mut store, &mut expense).unwrap();

        let stored = expenses_for_year(&store, 2024).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].category, "dining");
        assert!(stored[0].updated_at >= stored[0].created_at);
    }

    #[test]
    fn delete_expense_uses_the_year_embedded_in_the_id() {
        let mut store = MemoryStore::new();
        let expense =
            add_expense(&mut store, Decimal::new(900, 2), date(2023, 11, 2), "misc", "x").unwrap();
        delete_expense(&mut store, &expense.id).unwrap();
        assert_eq!(store.partition_len(&Partition::Ledger(2023)), 0);
        assert!(matches!(
            delete_expense(&mut store, "garbage-id"),
            Err(ReconcileError::NotFound(_))
        ));
    }
}
