use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::columns::{infer_columns, ColumnMap};
use crate::normalize::{normalize_amount, normalize_date, normalize_description};

/// One normalized statement row, ready to become a pending transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRow {
    pub date: NaiveDate,
    pub description: String,
    /// Always positive.
    pub amount: Decimal,
    /// Raw label from an explicit category column, if the file had one.
    pub category_label: Option<String>,
}

/// Row accounting for one parse run. Dropped rows are not individual errors;
/// callers surface the `skipped()` delta instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows_in: usize,
    pub parsed: usize,
}

impl ImportSummary {
    pub fn skipped(&self) -> usize {
        self.rows_in - self.parsed
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Statement has no header row")]
    EmptyInput,
    #[error("Could not resolve date, description and amount columns from the header row")]
    Columns,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Parse a raw CSV statement export. The first record is the required header
/// row; every data row is normalized independently and rows without a usable
/// description or positive amount are dropped. When the primary amount cell
/// is empty and the header had a second amount-like column (debit/credit
/// files), the secondary cell is used.
pub fn parse_statement(
    text: &str,
    today: NaiveDate,
) -> Result<(Vec<StatementRow>, ImportSummary), ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = rdr.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(ImportError::EmptyInput),
    };
    let headers: Vec<String> = header.iter().map(str::to_string).collect();
    let map = infer_columns(&headers).ok_or(ImportError::Columns)?;

    let mut rows = Vec::new();
    let mut rows_in = 0usize;
    for record in records {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue; // blank line, not a data row
        }
        rows_in += 1;
        if let Some(row) = parse_row(&record, &map, today) {
            rows.push(row);
        }
    }

    let summary = ImportSummary { rows_in, parsed: rows.len() };
    Ok((rows, summary))
}

fn parse_row(record: &csv::StringRecord, map: &ColumnMap, today: NaiveDate) -> Option<StatementRow> {
    let cell = |i: usize| record.get(i).unwrap_or("");

    let description = normalize_description(cell(map.description))?;
    let amount = normalize_amount(cell(map.amount))
        .or_else(|| map.secondary_amount.and_then(|i| normalize_amount(cell(i))))?;
    let date = normalize_date(cell(map.date), today);
    let category_label = map.category.and_then(|i| {
        let label = cell(i).trim();
        (!label.is_empty()).then(|| label.to_string())
    });

    Some(StatementRow { date, description, amount, category_label })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_debit_credit_statement() {
        let text = "Date,Description,Debit,Credit\n\
                    2024-03-01,\"Trader Joe's\",45.20,\n\
                    2024-03-02,\"Uber Trip\",,18.00\n";
        let (rows, summary) = parse_statement(text, today()).unwrap();
        assert_eq!(summary.rows_in, 2);
        assert_eq!(summary.parsed, 2);
        assert_eq!(rows[0].date, date(2024, 3, 1));
        assert_eq!(rows[0].description, "Trader Joe's");
        assert_eq!(rows[0].amount, Decimal::new(4520, 2));
        // Empty debit cell — the amount comes from the credit column.
        assert_eq!(rows[1].description, "Uber Trip");
        assert_eq!(rows[1].amount, Decimal::new(1800, 2));
    }

    #[test]
    fn category_column_label_is_carried_through() {
        let text = "Date,Description,Amount,Category\n\
                    2024-03-01,WALMART,12.00,Groceries\n\
                    2024-03-02,MYSTERY,9.99,\n";
        let (rows, _) = parse_statement(text, today()).unwrap();
        assert_eq!(rows[0].category_label.as_deref(), Some("Groceries"));
        assert_eq!(rows[1].category_label, None);
    }

    #[test]
    fn rows_without_amount_or_description_are_dropped_and_counted() {
        let text = "Date,Description,Amount\n\
                    2024-03-01,GOOD ROW,10.00\n\
                    2024-03-02,,10.00\n\
                    2024-03-03,NO AMOUNT,\n\
                    2024-03-04,ZERO,0.00\n";
        let (rows, summary) = parse_statement(text, today()).unwrap();
        assert_eq!(summary.rows_in, 4);
        assert_eq!(summary.parsed, 1);
        assert_eq!(summary.skipped(), 3);
        assert_eq!(rows[0].description, "GOOD ROW");
    }

    #[test]
    fn parsed_never_exceeds_rows_in_and_amounts_stay_positive() {
        let text = "Date,Description,Amount\n\
                    2024-01-05,REFUND,-30.00\n\
                    2024-01-06,\"1,234.56 CHARGE\",\"1,234.56\"\n\
                    junk line without commas\n";
        let (rows, summary) = parse_statement(text, today()).unwrap();
        assert!(summary.parsed <= summary.rows_in);
        for row in &rows {
            assert!(row.amount > Decimal::ZERO);
        }
        assert_eq!(rows[0].amount, Decimal::new(3000, 2));
        assert_eq!(rows[1].amount, Decimal::new(123456, 2));
    }

    #[test]
    fn unparseable_date_defaults_to_today() {
        let text = "Date,Description,Amount\npending,HOLD,5.00\n";
        let (rows, _) = parse_statement(text, today()).unwrap();
        assert_eq!(rows[0].date, today());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse_statement("", today()), Err(ImportError::EmptyInput)));
    }

    #[test]
    fn unresolvable_header_is_an_error() {
        assert!(matches!(
            parse_statement("OnlyColumn\n1\n", today()),
            Err(ImportError::Columns)
        ));
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let text = "Date,Description,Amount\r\n2024-03-01,CRLF ROW,7.50\r\n";
        let (rows, summary) = parse_statement(text, today()).unwrap();
        assert_eq!(summary.parsed, 1);
        assert_eq!(rows[0].description, "CRLF ROW");
    }
}
