//! Net worth snapshot assembled from flattened provider positions.

use crate::core::flatten::{flatten_assets, flatten_debts};
use crate::core::money::Money;
use crate::core::position::{AssetPosition, DebtPosition};
use crate::core::records::RawPortfolio;
use crate::core::source::PortfolioSource;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Assets and debts with their running totals. Totals only change together
/// with the position lists, through [`Portfolio::add_asset`] and
/// [`Portfolio::add_debt`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    net_worth: Money,
    total_assets: Money,
    total_debts: Money,
    assets: Vec<AssetPosition>,
    debts: Vec<DebtPosition>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_asset(&mut self, asset: AssetPosition) {
        self.total_assets += asset.position.value;
        self.net_worth += asset.position.value;
        self.assets.push(asset);
    }

    pub fn add_debt(&mut self, debt: DebtPosition) {
        self.total_debts += debt.position.value;
        self.net_worth -= debt.position.value;
        self.debts.push(debt);
    }

    pub fn net_worth(&self) -> Money {
        self.net_worth
    }

    pub fn total_assets(&self) -> Money {
        self.total_assets
    }

    pub fn total_debts(&self) -> Money {
        self.total_debts
    }

    pub fn assets(&self) -> &[AssetPosition] {
        &self.assets
    }

    pub fn debts(&self) -> &[DebtPosition] {
        &self.debts
    }
}

/// Keeps only leaf positions of `raw` and totals them.
pub fn build_portfolio(raw: &RawPortfolio) -> Portfolio {
    let mut portfolio = Portfolio::new();
    for asset in flatten_assets(&raw.assets) {
        portfolio.add_asset(asset);
    }
    for debt in flatten_debts(&raw.debts) {
        portfolio.add_debt(debt);
    }
    debug!(
        assets = portfolio.assets.len(),
        debts = portfolio.debts.len(),
        net_worth = %portfolio.net_worth,
        "Built portfolio"
    );
    portfolio
}

pub async fn get_portfolio(source: &dyn PortfolioSource) -> Result<Portfolio> {
    let raw = source.fetch_portfolio().await?;
    debug!(
        portfolio = %raw.name,
        assets = raw.assets.len(),
        debts = raw.debts.len(),
        "Fetched raw portfolio"
    );
    Ok(build_portfolio(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::{
        ParentRef, RawAssetPosition, RawDebtPosition, RawPosition, RawValue,
    };
    use async_trait::async_trait;

    fn position(id: &str, units: i64, parent: Option<&str>) -> RawPosition {
        RawPosition {
            id: id.to_string(),
            name: id.to_string(),
            value: RawValue {
                amount: Money::from_units(units),
                currency: "USD".to_string(),
            },
            parent: parent.map(|p| ParentRef {
                id: p.to_string(),
                name: p.to_string(),
            }),
            ..Default::default()
        }
    }

    struct MockPortfolioSource {
        portfolio: RawPortfolio,
    }

    #[async_trait]
    impl PortfolioSource for MockPortfolioSource {
        async fn fetch_portfolio(&self) -> Result<RawPortfolio> {
            Ok(self.portfolio.clone())
        }
    }

    #[test]
    fn test_net_worth() {
        let mut portfolio = Portfolio::new();
        portfolio.add_asset(AssetPosition::new("House", "", "real estate", Money::from_units(1_000_000)));
        portfolio.add_debt(DebtPosition::new("Loan", "loan", Money::from_units(400_000)));

        assert_eq!(portfolio.total_assets(), Money::from_units(1_000_000));
        assert_eq!(portfolio.total_debts(), Money::from_units(400_000));
        assert_eq!(portfolio.net_worth(), Money::from_units(600_000));
        assert_eq!(portfolio.assets().len(), 1);
        assert_eq!(portfolio.debts().len(), 1);
    }

    #[test]
    fn test_empty_portfolio_serializes_lists() {
        let json = serde_json::to_value(Portfolio::new()).unwrap();
        assert_eq!(json["net_worth"], 0.0);
        assert_eq!(json["assets"], serde_json::json!([]));
        assert_eq!(json["debts"], serde_json::json!([]));
    }

    #[test]
    fn test_build_portfolio_skips_parents() {
        let raw = RawPortfolio {
            id: "p".to_string(),
            name: "Main".to_string(),
            assets: vec![
                RawAssetPosition {
                    position: position("acct", 3_000_000, None),
                    ..Default::default()
                },
                RawAssetPosition {
                    position: position("fund1", 1_000_000, Some("acct")),
                    ..Default::default()
                },
                RawAssetPosition {
                    position: position("fund2", 2_000_000, Some("acct")),
                    ..Default::default()
                },
            ],
            debts: vec![RawDebtPosition {
                position: position("card", 500_000, None),
            }],
        };

        let portfolio = build_portfolio(&raw);

        assert_eq!(portfolio.assets().len(), 2);
        assert_eq!(portfolio.total_assets(), Money::from_units(3_000_000));
        assert_eq!(portfolio.total_debts(), Money::from_units(500_000));
        assert_eq!(portfolio.net_worth(), Money::from_units(2_500_000));
        assert!(portfolio.assets().iter().all(|a| a.position.name != "acct"));
    }

    #[tokio::test]
    async fn test_get_portfolio_uses_source() {
        let source = MockPortfolioSource {
            portfolio: RawPortfolio {
                assets: vec![RawAssetPosition {
                    position: position("cash", 1_000_000, None),
                    ..Default::default()
                }],
                debts: vec![RawDebtPosition {
                    position: position("loan", 400_000, None),
                }],
                ..Default::default()
            },
        };

        let portfolio = get_portfolio(&source).await.unwrap();

        assert_eq!(portfolio.net_worth(), Money::from_units(600_000));
    }
}
