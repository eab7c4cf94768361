//! Errors raised by the categorization and flattening engine.

use thiserror::Error;

/// Structural errors. Any of these aborts the current call and no partial
/// tree is returned.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid money value {value:?}")]
    InvalidFormat { value: String },

    #[error("invalid date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("cannot move subcategory {child} to another parent: {current} -> {requested}")]
    AlreadyAttached {
        child: String,
        current: String,
        requested: String,
    },

    #[error("cannot move transaction to another parent: {current} -> {requested}")]
    AlreadyAssigned { current: String, requested: String },

    #[error("cannot attach category {child} beneath its own descendant {parent}")]
    WouldCycle { child: String, parent: String },

    #[error("cannot attach bucket root {root} beneath {parent}")]
    RootNotAttachable { root: String, parent: String },
}

/// A reference that the provider data did not resolve. Never returned as an
/// error; it is logged and recorded on the affected transaction instead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    #[error("missing tag from provider response: {0}")]
    Tag(i64),
    #[error("missing category group from provider response: {0}")]
    CategoryGroup(i64),
    #[error("missing category from provider response: {0}")]
    Category(i64),
}

impl LookupMiss {
    /// Text stored under the `category_error` annotation, if this miss
    /// affects where the transaction is filed.
    pub fn category_error(&self) -> Option<&'static str> {
        match self {
            LookupMiss::Tag(_) => None,
            LookupMiss::CategoryGroup(_) => Some("uncategorized due to invalid category group id"),
            LookupMiss::Category(_) => Some("uncategorized due to invalid category id"),
        }
    }
}
