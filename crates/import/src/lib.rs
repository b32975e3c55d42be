pub mod columns;
pub mod csv;
pub mod keywords;
pub mod normalize;

pub use columns::{infer_columns, ColumnMap};
pub use csv::{parse_statement, ImportError, ImportSummary, StatementRow};
pub use keywords::{KeywordEntry, KeywordLoadError, KeywordSuggester};
pub use normalize::{normalize_amount, normalize_date, normalize_description};
