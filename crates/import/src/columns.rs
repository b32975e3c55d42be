/// Header-name substrings recognized per role, matched against lower-cased
/// headers. Order within a list is the preference order.
const DATE_HEADERS: &[&str] = &["date", "transaction date", "posting date", "txn date", "time"];
const DESCRIPTION_HEADERS: &[&str] = &[
    "description",
    "narrative",
    "particulars",
    "merchant",
    "payee",
    "memo",
    "narration",
];
const AMOUNT_HEADERS: &[&str] = &["amount", "debit", "credit", "withdrawal", "value"];
const CATEGORY_HEADERS: &[&str] = &["category", "type", "tag"];

/// Column roles inferred from a statement's header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub description: usize,
    pub amount: usize,
    /// Second amount-like column — the credit side of debit/credit files,
    /// consulted when the primary amount cell is empty.
    pub secondary_amount: Option<usize>,
    /// Explicit category column; optional, no positional fallback.
    pub category: Option<usize>,
}

/// Assign column roles from the header row. Two passes: name matching
/// (first unclaimed column, left to right, containing any candidate for the
/// role), then positional defaults (0 = date, 1 = description, last =
/// amount) for whatever is still missing. Returns `None` only when date,
/// description or amount cannot be resolved at all — in practice, fewer
/// than two columns. Pure and deterministic.
pub fn infer_columns(headers: &[String]) -> Option<ColumnMap> {
    let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut claimed = vec![false; lower.len()];

    let mut date = claim(&lower, &mut claimed, DATE_HEADERS);
    let mut description = claim(&lower, &mut claimed, DESCRIPTION_HEADERS);
    let mut amount = claim(&lower, &mut claimed, AMOUNT_HEADERS);
    let category = claim(&lower, &mut claimed, CATEGORY_HEADERS);
    let secondary_amount = if amount.is_some() {
        claim(&lower, &mut claimed, AMOUNT_HEADERS)
    } else {
        None
    };

    // Unnamed description columns are common; with three or more columns the
    // first unclaimed one is the best guess.
    if description.is_none() && lower.len() >= 3 {
        if let Some(idx) = claimed.iter().position(|c| !c) {
            claimed[idx] = true;
            description = Some(idx);
        }
    }

    // Positional defaults for anything still unresolved.
    if date.is_none() && !lower.is_empty() {
        date = Some(0);
    }
    if description.is_none() && lower.len() >= 2 {
        description = Some(1);
    }
    if amount.is_none() && !lower.is_empty() {
        amount = Some(lower.len() - 1);
    }

    match (date, description, amount) {
        (Some(date), Some(description), Some(amount)) => Some(ColumnMap {
            date,
            description,
            amount,
            secondary_amount,
            category,
        }),
        _ => None,
    }
}

fn claim(lower: &[String], claimed: &mut [bool], candidates: &[&str]) -> Option<usize> {
    for (i, header) in lower.iter().enumerate() {
        if claimed[i] {
            continue;
        }
        if candidates.iter().any(|c| header.contains(c)) {
            claimed[i] = true;
            return Some(i);
        }
    }
    None
}
