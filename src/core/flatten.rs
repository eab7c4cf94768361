//! Reduces provider position hierarchies to their leaves.
//!
//! Providers report group positions (an account holding several funds) next
//! to the positions they contain. Only leaves carry value of their own, so a
//! record that any other record names as its parent is dropped.

use crate::core::annotations::Annotated;
use crate::core::position::{AssetPosition, DebtPosition};
use crate::core::records::{RawAssetPosition, RawDebtPosition, RawPosition};
use std::collections::HashMap;

/// A record that may point at a parent record by id.
pub trait HierarchicalRecord {
    fn id(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
}

impl HierarchicalRecord for RawPosition {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.id.as_str())
    }
}

impl HierarchicalRecord for RawAssetPosition {
    fn id(&self) -> &str {
        self.position.id()
    }

    fn parent_id(&self) -> Option<&str> {
        self.position.parent_id()
    }
}

impl HierarchicalRecord for RawDebtPosition {
    fn id(&self) -> &str {
        self.position.id()
    }

    fn parent_id(&self) -> Option<&str> {
        self.position.parent_id()
    }
}

/// Converts every record that no other record references as its parent.
///
/// A `None` entry in the map is a tombstone: once an id is referenced as a
/// parent it is never converted or emitted, whether its own record comes
/// before or after the reference. Leaves are yielded in input order.
pub fn leaves<'a, R, T, F>(records: &'a [R], mut convert: F) -> impl Iterator<Item = T> + 'a
where
    R: HierarchicalRecord,
    F: FnMut(&R) -> T + 'a,
    T: 'a,
{
    let mut entries: HashMap<&'a str, Option<T>> = HashMap::new();
    let mut order: Vec<&'a str> = Vec::new();

    for record in records {
        if let Some(parent) = record.parent_id() {
            entries.insert(parent, None);
        }
        if matches!(entries.get(record.id()), Some(None)) {
            continue;
        }
        entries.insert(record.id(), Some(convert(record)));
        order.push(record.id());
    }

    order
        .into_iter()
        .filter_map(move |id| entries.remove(id).flatten())
}

/// Maps a provider `(type, subtype)` pair to the normalized asset taxonomy.
pub fn asset_type(kind: &str, subtype: &str) -> String {
    match (kind, subtype) {
        ("bank", _) => "cash".to_string(),
        ("investment", subtype) => subtype.to_string(),
        ("other", "home") => "real estate".to_string(),
        _ => "unknown".to_string(),
    }
}

pub fn flatten_assets(records: &[RawAssetPosition]) -> impl Iterator<Item = AssetPosition> + '_ {
    leaves(records, |raw| {
        let p = &raw.position;
        let mut asset = AssetPosition::new(
            p.name.as_str(),
            p.ticker.as_str(),
            asset_type(&p.kind, &p.subtype),
            p.value.amount,
        );
        asset.position.description = p.description.clone();
        asset.annotate("liquidity", raw.liquidity.as_str());
        asset.annotate("asset_class", raw.asset_class.as_str());
        asset.annotate("investable", raw.investable.as_str());
        if !p.note.is_empty() {
            asset.annotate("note", p.note.as_str());
        }
        asset
    })
}

pub fn flatten_debts(records: &[RawDebtPosition]) -> impl Iterator<Item = DebtPosition> + '_ {
    leaves(records, |raw| {
        let p = &raw.position;
        let mut debt = DebtPosition::new(p.name.as_str(), p.kind.as_str(), p.value.amount);
        debt.position.description = p.description.clone();
        if !p.note.is_empty() {
            debt.annotate("note", p.note.as_str());
        }
        debt
    })
}
