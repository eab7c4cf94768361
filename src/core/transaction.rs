use crate::core::annotations::{Annotated, Annotations};
use crate::core::category::CategoryId;
use crate::core::date::Date;
use crate::core::money::Money;
use serde::{Deserialize, Serialize};

/// A single financial transaction.
///
/// Once handed to a [`CategoryTree`](crate::core::category::CategoryTree) the
/// transaction is only reachable through shared references, except for
/// annotation additions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: Date,
    pub payee: String,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
    /// Category the transaction is filed under. Set exactly once by the tree.
    #[serde(skip)]
    pub(crate) category: Option<CategoryId>,
}

impl Transaction {
    pub fn new(date: Date, payee: impl Into<String>, amount: Money) -> Self {
        Self {
            date,
            payee: payee.into(),
            amount,
            description: String::new(),
            annotations: Annotations::new(),
            category: None,
        }
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }
}

impl Annotated for Transaction {
    fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}
