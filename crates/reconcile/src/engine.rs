use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use outlay_core::{resolve_label, Category, CategorySource, Expense, PendingTransaction, TxnStatus};
use outlay_import::{parse_statement, KeywordSuggester};
use outlay_rules::{apply_rules, RulePassSummary, TransactionRule};

use crate::classifier::{Classifier, SuggestionRequest};
use crate::error::ReconcileError;
use crate::ledger;
use crate::store::{Partition, RecordStore};

/// Everything an import run needs besides the raw statement text.
pub struct ImportContext<'a> {
    pub categories: &'a [Category],
    pub rules: &'a [TransactionRule],
    pub keywords: &'a KeywordSuggester,
    /// Free-text origin label stamped on each imported transaction.
    pub source: Option<&'a str>,
    /// Clock for the unparseable-date fallback; passed in so imports are
    /// reproducible.
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: usize,
    /// Rows dropped during normalization, reported as a count rather than
    /// individual errors.
    pub skipped: usize,
    pub auto_mapped: usize,
}

/// Owns the pending-transaction lifecycle: import, classification merging,
/// ignore/unignore, session overrides, and confirmation into the ledger.
///
/// Every operation is one synchronous run-to-completion call. Operations
/// that touch the store more than once do so sequentially and never roll
/// back partial progress (the store has no transaction primitive), so
/// confirm is made retry-safe by deterministic expense ids instead.
pub struct ReconcileEngine<S: RecordStore> {
    store: S,
    /// Session-local category overrides keyed by transaction id, merged into
    /// the persisted records only on save or confirm.
    overrides: HashMap<String, String>,
}

impl<S: RecordStore> ReconcileEngine<S> {
    pub fn new(store: S) -> Self {
        ReconcileEngine { store, overrides: HashMap::new() }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    fn load_partition(&self, status: TxnStatus) -> Result<Vec<PendingTransaction>, ReconcileError> {
        self.store
            .get_rows(&Partition::Pending(status))?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    /// The full pending set, in partition order.
    pub fn pending(&self) -> Result<Vec<PendingTransaction>, ReconcileError> {
        let mut all = Vec::new();
        for status in TxnStatus::ALL {
            all.extend(self.load_partition(status)?);
        }
        Ok(all)
    }

    fn find(&self, id: &str) -> Result<PendingTransaction, ReconcileError> {
        for status in TxnStatus::ALL {
            if let Some(txn) = self.load_partition(status)?.into_iter().find(|t| t.id == id) {
                return Ok(txn);
            }
        }
        Err(ReconcileError::NotFound(id.to_string()))
    }

    // ── Persistence helpers ───────────────────────────────────────────────────

    /// Write one transaction back; a status change moves it between
    /// partitions.
    fn persist_update(
        &mut self,
        txn: &PendingTransaction,
        previous: TxnStatus,
    ) -> Result<(), ReconcileError> {
        let row = serde_json::to_value(txn)?;
        if txn.status == previous {
            self.store.update_row(&Partition::Pending(previous), &txn.id, row)?;
        } else {
            self.store.delete_row(&Partition::Pending(previous), &txn.id)?;
            self.store.append_rows(&Partition::Pending(txn.status), vec![row])?;
        }
        Ok(())
    }

    /// Bulk rewrite of all pending partitions from an in-memory set.
    fn rewrite_partitions(&mut self, txns: &[PendingTransaction]) -> Result<(), ReconcileError> {
        for status in TxnStatus::ALL {
            let rows: Vec<Value> = txns
                .iter()
                .filter(|t| t.status == status)
                .map(serde_json::to_value)
                .collect::<Result<_, _>>()?;
            self.store.replace_all(&Partition::Pending(status), rows)?;
        }
        Ok(())
    }

    // ── Import ────────────────────────────────────────────────────────────────

    /// Ingest a raw CSV statement. Category at import time, in order: the
    /// statement's own category column, then the keyword dictionary (both
    /// provenance-free heuristics), then a rule pass over the whole batch.
    /// Anything that ends up with a category enters auto-mapped, the rest
    /// uncategorized.
    pub fn import_statement(
        &mut self,
        csv_text: &str,
        ctx: &ImportContext<'_>,
    ) -> Result<ImportOutcome, ReconcileError> {
        let (rows, summary) = parse_statement(csv_text, ctx.today)?;

        let mut txns = Vec::with_capacity(rows.len());
        for row in rows {
            let mut txn = PendingTransaction::new(row.date, &row.description, row.amount);
            txn.source = ctx.source.map(str::to_string);
            if let Some(category) = row
                .category_label
                .as_deref()
                .and_then(|label| resolve_label(ctx.categories, label))
            {
                txn.suggest_category(&category.id);
            } else if let Some(category) = ctx.keywords.suggest(&row.description) {
                txn.suggest_category(category);
            }
            txns.push(txn);
        }

        apply_rules(&mut txns, ctx.rules);
        // A heuristic category also counts as mapped at import time.
        for txn in &mut txns {
            if txn.is_classified() {
                txn.status = TxnStatus::AutoMapped;
            }
        }

        let auto_mapped = txns.iter().filter(|t| t.status == TxnStatus::AutoMapped).count();
        for status in [TxnStatus::AutoMapped, TxnStatus::Uncategorized] {
            let rows: Vec<Value> = txns
                .iter()
                .filter(|t| t.status == status)
                .map(serde_json::to_value)
                .collect::<Result<_, _>>()?;
            if !rows.is_empty() {
                self.store.append_rows(&Partition::Pending(status), rows)?;
            }
        }

        let outcome =
            ImportOutcome { imported: txns.len(), skipped: summary.skipped(), auto_mapped };
        info!(
            imported = outcome.imported,
            skipped = outcome.skipped,
            auto_mapped = outcome.auto_mapped,
            "statement imported"
        );
        Ok(outcome)
    }

    // ── Rule passes ───────────────────────────────────────────────────────────

    /// Full-set rule pass followed by a bulk partition rewrite.
    pub fn run_rules(&mut self, rules: &[TransactionRule]) -> Result<RulePassSummary, ReconcileError> {
        let mut txns = self.pending()?;
        let summary = apply_rules(&mut txns, rules);
        self.rewrite_partitions(&txns)?;
        info!(mapped = summary.mapped, reverted = summary.reverted, "rule pass complete");
        Ok(summary)
    }

    /// Incremental pass for a just-created rule: only the uncategorized
    /// partition is read, and only matches move.
    pub fn apply_new_rule(&mut self, rule: &TransactionRule) -> Result<usize, ReconcileError> {
        let mut txns = self.load_partition(TxnStatus::Uncategorized)?;
        let promoted = outlay_rules::apply_new_rule(&mut txns, rule);
        if promoted == 0 {
            return Ok(0);
        }
        let (mapped, remaining): (Vec<_>, Vec<_>) =
            txns.into_iter().partition(|t| t.status == TxnStatus::AutoMapped);
        let remaining_rows: Vec<Value> =
            remaining.iter().map(serde_json::to_value).collect::<Result<_, _>>()?;
        let mapped_rows: Vec<Value> =
            mapped.iter().map(serde_json::to_value).collect::<Result<_, _>>()?;
        self.store
            .replace_all(&Partition::Pending(TxnStatus::Uncategorized), remaining_rows)?;
        self.store.append_rows(&Partition::Pending(TxnStatus::AutoMapped), mapped_rows)?;
        Ok(promoted)
    }

    // ── Classification merging ────────────────────────────────────────────────

    /// Merge classifier suggestions into the pending set. Merge-safe against
    /// a set that changed underneath: stale transaction ids and unknown
    /// category ids are skipped, as is anything already classified or
    /// ignored. A classifier failure degrades to "no suggestions".
    pub fn apply_suggestions(
        &mut self,
        classifier: &dyn Classifier,
        categories: &[Category],
        recent: &[Expense],
    ) -> Result<usize, ReconcileError> {
        let pending = self.pending()?;
        let requests: Vec<SuggestionRequest> = pending
            .iter()
            .filter(|t| !t.is_classified() && t.status != TxnStatus::Ignored)
            .map(|t| SuggestionRequest {
                id: t.id.clone(),
                description: t.description.clone(),
                amount: t.amount,
            })
            .collect();
        if requests.is_empty() {
            return Ok(0);
        }

        let suggestions = match classifier.suggest(&requests, recent, categories) {
            Ok(suggestions) => suggestions,
            Err(err) => {
                warn!(%err, "classifier unavailable, continuing without suggestions");
                return Ok(0);
            }
        };

        let mut applied = 0;
        for suggestion in suggestions {
            let Some(txn) = pending.iter().find(|t| t.id == suggestion.transaction_id) else {
                continue;
            };
            if txn.is_classified() || txn.status == TxnStatus::Ignored {
                continue;
            }
            if !categories.iter().any(|c| c.id == suggestion.category_id) {
                continue;
            }
            let mut updated = txn.clone();
            updated.classify(&suggestion.category_id, CategorySource::Ai, None);
            self.persist_update(&updated, txn.status)?;
            applied += 1;
        }
        info!(applied, "ai suggestions merged");
        Ok(applied)
    }

    /// Manual classification has top precedence and always applies. Status is not
    /// changed: only the batch rule pass promotes to auto-mapped.
    pub fn set_category(&mut self, id: &str, category_id: &str) -> Result<(), ReconcileError> {
        let mut txn = self.find(id)?;
        let previous = txn.status;
        txn.classify(category_id, CategorySource::Manual, None);
        self.persist_update(&txn, previous)
    }

    /// Human clearing a classification; a non-ignored transaction reverts to
    /// uncategorized.
    pub fn clear_category(&mut self, id: &str) -> Result<(), ReconcileError> {
        let mut txn = self.find(id)?;
        let previous = txn.status;
        txn.clear_classification();
        if txn.status != TxnStatus::Ignored {
            txn.status = TxnStatus::Uncategorized;
        }
        self.persist_update(&txn, previous)
    }

    /// One category across many transactions, each becoming a manual
    /// classification. Store calls are sequential (one per transaction).
    pub fn bulk_categorize(&mut self, ids: &[String], category_id: &str) -> Result<usize, ReconcileError> {
        for id in ids {
            self.set_category(id, category_id)?;
        }
        Ok(ids.len())
    }

    // ── Ignore / delete ───────────────────────────────────────────────────────

    /// Any non-ignored transaction → ignored. Classification fields are left
    /// intact so unignoring restores them without recomputation.
    pub fn ignore(&mut self, id: &str) -> Result<(), ReconcileError> {
        let mut txn = self.find(id)?;
        if txn.status == TxnStatus::Ignored {
            return Ok(());
        }
        let previous = txn.status;
        txn.status = TxnStatus::Ignored;
        self.persist_update(&txn, previous)
    }

    /// Ignored → uncategorized, never straight back to auto-mapped: a fresh
    /// rule pass is required to regain mapped status.
    pub fn unignore(&mut self, id: &str) -> Result<(), ReconcileError> {
        let mut txn = self.find(id)?;
        if txn.status != TxnStatus::Ignored {
            return Ok(());
        }
        txn.status = TxnStatus::Uncategorized;
        self.persist_update(&txn, TxnStatus::Ignored)
    }

    /// Remove a pending transaction outright, with no ledger side effect.
    pub fn delete(&mut self, id: &str) -> Result<(), ReconcileError> {
        let txn = self.find(id)?;
        self.overrides.remove(id);
        self.store.delete_row(&Partition::Pending(txn.status), id)?;
        Ok(())
    }

    // ── Session overrides ─────────────────────────────────────────────────────

    /// Stage a session-local category override; nothing is persisted until
    /// save or confirm.
    pub fn stage_override(&mut self, id: &str, category_id: &str) {
        self.overrides.insert(id.to_string(), category_id.to_string());
    }

    pub fn clear_override(&mut self, id: &str) {
        self.overrides.remove(id);
    }

    pub fn override_for(&self, id: &str) -> Option<&str> {
        self.overrides.get(id).map(String::as_str)
    }

    /// The category confirm would use: staged override first, then the
    /// persisted classification.
    pub fn effective_category<'a>(&'a self, txn: &'a PendingTransaction) -> Option<&'a str> {
        self.override_for(&txn.id).or(txn.category.as_deref())
    }

    /// Persist every staged override as a manual classification, then drop
    /// it from the staging map.
    pub fn save_overrides(&mut self) -> Result<usize, ReconcileError> {
        let staged: Vec<(String, String)> =
            self.overrides.iter().map(|(id, cat)| (id.clone(), cat.clone())).collect();
        let mut saved = 0;
        for (id, category_id) in staged {
            self.set_category(&id, &category_id)?;
            self.overrides.remove(&id);
            saved += 1;
        }
        Ok(saved)
    }

    // ── Confirm ───────────────────────────────────────────────────────────────

    /// Convert one classified transaction into a ledger expense and remove
    /// it from the pending store. The expense id reuses the transaction id,
    /// so a retry after a partial failure re-appends the same id rather than
    /// minting a second distinct expense.
    pub fn confirm(&mut self, id: &str) -> Result<Expense, ReconcileError> {
        let txn = self.find(id)?;
        let category = self
            .effective_category(&txn)
            .ok_or_else(|| ReconcileError::Unclassified(id.to_string()))?
            .to_string();
        let expense = Expense::from_pending(&txn, &category);
        self.store
            .append_rows(&Partition::Ledger(expense.year()), vec![serde_json::to_value(&expense)?])?;
        self.store.delete_row(&Partition::Pending(txn.status), id)?;
        self.overrides.remove(id);
        info!(id, year = expense.year(), "transaction confirmed");
        Ok(expense)
    }

    /// Bulk confirm. The whole batch is validated before the first store
    /// write: an unknown id or a missing effective category aborts with the
    /// offending indices. The ledger append and the pending rewrite remain
    /// separate store calls (best-effort, not atomic), but the derived
    /// expense ids make a retried batch idempotent at the ledger.
    pub fn confirm_all(&mut self, ids: &[String]) -> Result<Vec<Expense>, ReconcileError> {
        let pending = self.pending()?;

        let mut invalid = Vec::new();
        let mut expenses = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            let Some(txn) = pending.iter().find(|t| &t.id == id) else {
                invalid.push(i);
                continue;
            };
            match self.effective_category(txn) {
                Some(category) => expenses.push(Expense::from_pending(txn, category)),
                None => invalid.push(i),
            }
        }
        if !invalid.is_empty() {
            return Err(ReconcileError::InvalidEntries(invalid));
        }

        ledger::append_expenses(&mut self.store, &expenses)?;
        let remaining: Vec<PendingTransaction> =
            pending.into_iter().filter(|t| !ids.contains(&t.id)).collect();
        self.rewrite_partitions(&remaining)?;
        for id in ids {
            self.overrides.remove(id);
        }
        info!(confirmed = expenses.len(), "bulk confirm complete");
        Ok(expenses)
    }
}
