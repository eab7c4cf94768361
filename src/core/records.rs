//! Raw records as delivered by the providers, before normalization.

use crate::core::money::Money;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use tracing::warn;

/// Treats an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TagRef {
    pub id: i64,
}

/// A transaction from the Lunch Money API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub date: String,
    /// Amount already converted to the account's base currency.
    #[serde(rename = "to_base", default, deserialize_with = "nullable")]
    pub amount: Money,
    #[serde(default, deserialize_with = "nullable")]
    pub payee: String,
    #[serde(rename = "original_name", default, deserialize_with = "nullable")]
    pub original_payee: String,
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub category_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub category_group_id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub category_group_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub is_income: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub exclude_from_budget: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub exclude_from_totals: bool,
    #[serde(rename = "display_notes", default, deserialize_with = "nullable")]
    pub notes: String,
    #[serde(default)]
    pub recurring_cadence: Option<String>,
    #[serde(default)]
    pub recurring_description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<TagRef>,
}

impl RawTransaction {
    /// Category id, with 0 meaning "no category".
    pub fn category(&self) -> Option<i64> {
        (self.category_id != 0).then_some(self.category_id)
    }

    pub fn category_group(&self) -> Option<i64> {
        (self.category_group_id != 0).then_some(self.category_group_id)
    }
}

/// A category, or category group with `children`, from the Lunch Money API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCategory {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub order: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub is_income: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub exclude_from_budget: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub exclude_from_totals: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_archived: bool,
    #[serde(default)]
    pub archived_on: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub children: Vec<RawCategory>,
}

/// Every category and group reachable from a nested listing, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex(HashMap<i64, RawCategory>);

impl CategoryIndex {
    /// Indexes `categories` and all their descendants in pre-order. When an id
    /// shows up twice, the first occurrence wins: a later duplicate never
    /// overwrites the indexed entry, and its children are not visited.
    pub fn from_nested(categories: &[RawCategory]) -> Self {
        let mut index = HashMap::new();
        let mut stack: Vec<&RawCategory> = categories.iter().rev().collect();
        while let Some(category) = stack.pop() {
            if index.contains_key(&category.id) {
                warn!(id = category.id, "Duplicate category id in provider response");
                continue;
            }
            index.insert(category.id, category.clone());
            stack.extend(category.children.iter().rev());
        }
        Self(index)
    }

    pub fn get(&self, id: i64) -> Option<&RawCategory> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTag {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(rename = "archived", default, deserialize_with = "nullable")]
    pub is_archived: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TagIndex(HashMap<i64, RawTag>);

impl TagIndex {
    pub fn get(&self, id: i64) -> Option<&RawTag> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RawTag> for TagIndex {
    fn from_iter<I: IntoIterator<Item = RawTag>>(iter: I) -> Self {
        Self(iter.into_iter().map(|tag| (tag.id, tag)).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawValue {
    #[serde(default, deserialize_with = "nullable")]
    pub amount: Money,
    #[serde(default, deserialize_with = "nullable")]
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Geography {
    #[serde(default, deserialize_with = "nullable")]
    pub country: String,
    #[serde(default, deserialize_with = "nullable")]
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParentRef {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

/// Fields shared by Kubera assets and debts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPosition {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub note: String,
    #[serde(default, deserialize_with = "nullable")]
    pub value: RawValue,
    #[serde(default, deserialize_with = "nullable")]
    pub ticker: String,
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,
    #[serde(rename = "subType", default, deserialize_with = "nullable")]
    pub subtype: String,
    #[serde(default)]
    pub parent: Option<ParentRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawAssetPosition {
    #[serde(flatten)]
    pub position: RawPosition,
    #[serde(default, deserialize_with = "nullable")]
    pub investable: String,
    #[serde(default, deserialize_with = "nullable")]
    pub liquidity: String,
    #[serde(rename = "assetClass", default, deserialize_with = "nullable")]
    pub asset_class: String,
    #[serde(default)]
    pub geography: Option<Geography>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDebtPosition {
    #[serde(flatten)]
    pub position: RawPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPortfolio {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "asset", default, deserialize_with = "nullable")]
    pub assets: Vec<RawAssetPosition>,
    #[serde(rename = "debt", default, deserialize_with = "nullable")]
    pub debts: Vec<RawDebtPosition>,
}
