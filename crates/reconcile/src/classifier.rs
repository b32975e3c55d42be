use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use outlay_core::{Category, Expense};

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier backend error: {0}")]
    Backend(String),
    #[error("Malformed classifier response: {0}")]
    Malformed(String),
}

/// The slice of a pending transaction the external classifier sees.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionRequest {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
}

/// One classifier verdict, merged back into the pending set by transaction
/// id — ids that no longer exist are simply dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub transaction_id: String,
    pub category_id: String,
}

/// Abstraction over the external category-suggestion service. Treat it as
/// slow and fallible: an error means "no suggestions this time", never a
/// failed operation.
pub trait Classifier {
    fn suggest(
        &self,
        pending: &[SuggestionRequest],
        recent: &[Expense],
        categories: &[Category],
    ) -> Result<Vec<Suggestion>, ClassifierError>;
}

/// Returns preset suggestions — lets engine tests exercise the merge path
/// without a live service.
#[derive(Debug, Default)]
pub struct MockClassifier {
    pub suggestions: Vec<Suggestion>,
    pub fail: bool,
}

impl MockClassifier {
    pub fn new(suggestions: Vec<Suggestion>) -> Self {
        MockClassifier { suggestions, fail: false }
    }

    pub fn failing() -> Self {
        MockClassifier { suggestions: Vec::new(), fail: true }
    }
}

impl Classifier for MockClassifier {
    fn suggest(
        &self,
        _pending: &[SuggestionRequest],
        _recent: &[Expense],
        _categories: &[Category],
    ) -> Result<Vec<Suggestion>, ClassifierError> {
        if self.fail {
            return Err(ClassifierError::Backend("mock failure".to_string()));
        }
        Ok(self.suggestions.clone())
    }
}
