pub mod category;
pub mod expense;
pub mod pending;

pub use category::{resolve_label, Category};
pub use expense::Expense;
pub use pending::{CategorySource, PendingTransaction, TxnStatus};
