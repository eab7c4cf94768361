//! Provider abstractions handed to the core entry points.

use crate::core::date::DateRange;
use crate::core::records::{CategoryIndex, RawPortfolio, RawTransaction, TagIndex};
use anyhow::Result;
use async_trait::async_trait;

/// Supplies transactions together with the category and tag reference data
/// needed to file them.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn list_categories(&self) -> Result<CategoryIndex>;
    async fn list_tags(&self) -> Result<TagIndex>;
    async fn list_transactions(&self, range: &DateRange) -> Result<Vec<RawTransaction>>;
}

#[async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn fetch_portfolio(&self) -> Result<RawPortfolio>;
}
