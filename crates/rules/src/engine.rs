use rust_decimal::Decimal;

use outlay_core::{CategorySource, PendingTransaction, TxnStatus};

use crate::rule::TransactionRule;

/// Outcome counts for a batch rule pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RulePassSummary {
    /// Transactions newly mapped or re-mapped to a different rule/category.
    pub mapped: usize,
    /// Rule-classified transactions whose rule no longer matches, reverted
    /// to uncategorized.
    pub reverted: usize,
    pub unchanged: usize,
}

/// First enabled rule matching the transaction, in list order. List order is
/// the only tie-break.
pub fn first_match<'a>(
    rules: &'a [TransactionRule],
    description: &str,
    amount: Decimal,
) -> Option<&'a TransactionRule> {
    rules.iter().find(|r| r.matches(description, amount))
}

/// The full-set rule pass. For every transaction that is not ignored:
///
/// - the first matching enabled rule classifies it (status auto-mapped,
///   provenance `Rule`) — unless a manual classification outranks the rule;
/// - a transaction whose previous rule match is gone (rule deleted,
///   disabled, or edited away) reverts to uncategorized;
/// - everything else, including manual and AI classifications, is preserved.
///
/// Running the same rule set twice leaves the set unchanged on the second
/// pass.
pub fn apply_rules(txns: &mut [PendingTransaction], rules: &[TransactionRule]) -> RulePassSummary {
    let enabled: Vec<&TransactionRule> = rules.iter().filter(|r| r.enabled).collect();
    let mut summary = RulePassSummary::default();

    for txn in txns.iter_mut() {
        if txn.status == TxnStatus::Ignored {
            summary.unchanged += 1;
            continue;
        }
        let hit = enabled.iter().find(|r| r.matches(&txn.description, txn.amount));
        match hit {
            Some(rule) if CategorySource::can_replace(txn.category_source, CategorySource::Rule) => {
                let already_mapped = txn.status == TxnStatus::AutoMapped
                    && txn.matched_rule_id.as_deref() == Some(rule.id.as_str())
                    && txn.category.as_deref() == Some(rule.category_id.as_str());
                txn.classify(&rule.category_id, CategorySource::Rule, Some(rule.id.as_str()));
                txn.status = TxnStatus::AutoMapped;
                if already_mapped {
                    summary.unchanged += 1;
                } else {
                    summary.mapped += 1;
                }
            }
            // A manual classification outranks the rule; leave it alone.
            Some(_) => summary.unchanged += 1,
            None if txn.matched_rule_id.is_some() => {
                txn.clear_classification();
                txn.status = TxnStatus::Uncategorized;
                summary.reverted += 1;
            }
            None => summary.unchanged += 1,
        }
    }
    summary
}

/// Incremental pass for a just-created rule: only transactions that are
/// still uncategorized and carry no classification are tested, so nothing a
/// human, the classifier, or an import heuristic already categorized gets
/// reclassified.
pub fn apply_new_rule(txns: &mut [PendingTransaction], rule: &TransactionRule) -> usize {
    if !rule.enabled {
        return 0;
    }
    let mut promoted = 0;
    for txn in txns.iter_mut() {
        if txn.status != TxnStatus::Uncategorized || txn.is_classified() {
            continue;
        }
        if rule.matches(&txn.description, txn.amount) {
            txn.classify(&rule.category_id, CategorySource::Rule, Some(rule.id.as_str()));
            txn.status = TxnStatus::AutoMapped;
            promoted += 1;
        }
    }
    promoted
}
