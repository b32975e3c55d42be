pub mod classifier;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod store;

pub use classifier::{Classifier, ClassifierError, MockClassifier, Suggestion, SuggestionRequest};
pub use engine::{ImportContext, ImportOutcome, ReconcileEngine};
pub use error::ReconcileError;
pub use ledger::{add_expense, append_batch, delete_expense, expenses_for_year, update_expense, ExpenseDraft};
pub use store::{MemoryStore, Partition, RecordStore, StoreError};
