//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod budget;
mod category;
mod import_job;
mod merchant;
pub mod result;
pub mod state;
mod tag;
pub mod transaction;

pub use account::{Account, Currency};
pub use budget::{BudgetRow, Month};
pub use category::{Category, CategoryType};
pub use import_job::{ImportJob, ImportJobError, ImportJobMapping, ImportJobStatus, MappingType};
pub use merchant::Merchant;
pub use result::{Error, OperationResult};
pub use state::{BudgetSettings, BudgetState, STATE_VERSION};
pub use tag::{Tag, TransactionTag};
pub use transaction::{build_import_key, Transaction, TransactionSplit, TransactionType};
