//! Core business logic abstractions

pub mod annotations;
pub mod categorize;
pub mod category;
pub mod config;
pub mod date;
pub mod error;
pub mod flatten;
pub mod log;
pub mod money;
pub mod portfolio;
pub mod position;
pub mod records;
pub mod source;
pub mod transaction;

// Re-export main types for cleaner imports
pub use annotations::{Annotated, Annotations};
pub use categorize::{categorize, get_categorized_transactions};
pub use category::{Bucket, Categories, Category, CategoryId, CategoryTree, TransactionId};
pub use date::{Date, DateRange};
pub use error::{CoreError, LookupMiss};
pub use money::Money;
pub use portfolio::{Portfolio, build_portfolio, get_portfolio};
pub use position::{AssetPosition, DebtPosition, Position};
pub use source::{PortfolioSource, TransactionSource};
pub use transaction::Transaction;
