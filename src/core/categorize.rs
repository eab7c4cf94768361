//! Sorts provider transactions into Income, Expenses and Ignored trees.
//!
//! Missing tags, categories and category groups never abort a run. The
//! transaction is filed under an `Uncategorized` bucket instead and the reason
//! is kept in its `category_error` annotation. Unparsable dates and tree
//! invariant violations abort the whole run.

use crate::core::annotations::Annotated;
use crate::core::category::{Bucket, Categories, CategoryId};
use crate::core::date::{Date, DateRange};
use crate::core::error::{CoreError, LookupMiss};
use crate::core::records::{CategoryIndex, RawCategory, RawTag, RawTransaction, TagIndex};
use crate::core::source::TransactionSource;
use crate::core::transaction::Transaction;
use anyhow::Result;
use tracing::{debug, warn};

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const CATEGORY_ERROR: &str = "category_error";

/// Fetches reference data and transactions for `range` from `source` and
/// categorizes them.
pub async fn get_categorized_transactions(
    source: &dyn TransactionSource,
    range: &DateRange,
) -> Result<Categories> {
    let (categories, tags, transactions) = futures::try_join!(
        source.list_categories(),
        source.list_tags(),
        source.list_transactions(range),
    )?;
    debug!(
        categories = categories.len(),
        tags = tags.len(),
        transactions = transactions.len(),
        "Fetched transaction data"
    );
    Ok(categorize(&transactions, &categories, &tags)?)
}

/// Files every transaction, in input order, into a fresh [`Categories`].
pub fn categorize(
    transactions: &[RawTransaction],
    categories: &CategoryIndex,
    tags: &TagIndex,
) -> Result<Categories, CoreError> {
    let mut result = Categories::new();

    for raw in transactions {
        let mut txn = build_transaction(raw)?;

        for tag_ref in &raw.tags {
            match tags.get(tag_ref.id) {
                Some(tag) => add_transaction_tag(&mut txn, tag),
                None => warn!(transaction = raw.id, "{}", LookupMiss::Tag(tag_ref.id)),
            }
        }

        let bucket = result.root(select_bucket(raw));
        let target = match place(&mut result, bucket, raw, categories)? {
            Placement::Category(id) => id,
            Placement::Uncategorized { parent, miss } => {
                if let Some(miss) = miss {
                    warn!(transaction = raw.id, "{miss}");
                    if let Some(reason) = miss.category_error() {
                        txn.annotate(CATEGORY_ERROR, reason);
                    }
                }
                result.find_or_create_by_name(parent, UNCATEGORIZED)?
            }
        };

        let id = result.insert_transaction(txn);
        result.add_transaction(target, id)?;
    }

    Ok(result)
}

enum Placement {
    Category(CategoryId),
    Uncategorized {
        parent: CategoryId,
        miss: Option<LookupMiss>,
    },
}

/// Resolves the category a transaction belongs to, descending into its
/// category group first when it has one. A miss after descending leaves the
/// transaction uncategorized inside the group.
fn place(
    result: &mut Categories,
    bucket: CategoryId,
    raw: &RawTransaction,
    categories: &CategoryIndex,
) -> Result<Placement, CoreError> {
    let Some(category_id) = raw.category() else {
        return Ok(Placement::Uncategorized {
            parent: bucket,
            miss: None,
        });
    };

    let mut parent = bucket;
    if let Some(group_id) = raw.category_group() {
        let Some(group) = categories.get(group_id) else {
            return Ok(Placement::Uncategorized {
                parent,
                miss: Some(LookupMiss::CategoryGroup(group_id)),
            });
        };
        if group.name != result.tree().category(parent).name() {
            parent = find_or_create_category(result, parent, group)?;
        }
    }

    match categories.get(category_id) {
        Some(category) => Ok(Placement::Category(find_or_create_category(
            result, parent, category,
        )?)),
        None => Ok(Placement::Uncategorized {
            parent,
            miss: Some(LookupMiss::Category(category_id)),
        }),
    }
}

fn select_bucket(raw: &RawTransaction) -> Bucket {
    if raw.is_income {
        Bucket::Income
    } else if raw.exclude_from_budget || raw.exclude_from_totals {
        Bucket::Ignored
    } else {
        Bucket::Expenses
    }
}

fn build_transaction(raw: &RawTransaction) -> Result<Transaction, CoreError> {
    let date = Date::parse(&raw.date)?;
    let mut txn = Transaction::new(date, raw.payee.as_str(), raw.amount);
    txn.description = raw.notes.clone();
    Ok(txn)
}

fn add_transaction_tag(txn: &mut Transaction, tag: &RawTag) {
    if tag.is_archived {
        debug!(tag = tag.id, name = %tag.name, "Skipping archived tag");
        return;
    }
    txn.annotate(
        format!("tag:{}", tag.id),
        format!("{}: {}", tag.name, tag.description),
    );
}

/// Child of `parent` named after `category`, carrying its description.
fn find_or_create_category(
    result: &mut Categories,
    parent: CategoryId,
    category: &RawCategory,
) -> Result<CategoryId, CoreError> {
    let id = result.find_or_create_by_name(parent, &category.name)?;
    result.category_mut(id).description = category.description.clone();
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::category::CategoryTree;
    use crate::core::money::Money;
    use crate::core::records::TagRef;
    use async_trait::async_trait;

    fn category(id: i64, name: &str, description: &str) -> RawCategory {
        RawCategory {
            id,
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn tag(id: i64, name: &str, description: &str, archived: bool) -> RawTag {
        RawTag {
            id,
            name: name.to_string(),
            description: description.to_string(),
            is_archived: archived,
        }
    }

    fn txn(id: i64, amount: i64, category_id: i64, group_id: i64) -> RawTransaction {
        RawTransaction {
            id,
            date: "2024-01-15".to_string(),
            amount: Money::from_units(amount),
            payee: format!("payee-{id}"),
            category_id,
            category_group_id: group_id,
            ..Default::default()
        }
    }

    fn reference_data() -> CategoryIndex {
        CategoryIndex::from_nested(&[
            RawCategory {
                children: vec![
                    category(11, "Groceries", "food at home"),
                    category(12, "Restaurants", "eating out"),
                ],
                ..category(10, "Food", "all food")
            },
            category(20, "Income", "income group"),
            category(21, "Salary", "paycheck"),
            category(30, "Rent", "housing"),
        ])
    }

    fn child(tree: &CategoryTree, parent: CategoryId, name: &str) -> CategoryId {
        tree.find_by_name(parent, name)
            .unwrap_or_else(|| panic!("{name} not found under {}", tree.category(parent).name()))
    }

    fn only_transaction(tree: &CategoryTree, id: CategoryId) -> &Transaction {
        let txns = tree.category(id).transactions();
        assert_eq!(txns.len(), 1);
        tree.transaction(txns[0])
    }

    #[test]
    fn test_build_transaction() {
        let raw = RawTransaction {
            date: "2021-02-03".to_string(),
            payee: "TestPayee".to_string(),
            amount: Money::from_units(1234),
            notes: "Some notes".to_string(),
            ..Default::default()
        };
        let t = build_transaction(&raw).unwrap();
        assert_eq!(t.payee, "TestPayee");
        assert_eq!(t.amount, Money::from_units(1234));
        assert_eq!(t.description, "Some notes");
        assert_eq!(t.date.to_string(), "2021-02-03");
    }

    #[test]
    fn test_build_transaction_invalid_date() {
        let raw = RawTransaction {
            date: "not-a-date".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_transaction(&raw),
            Err(CoreError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_archived_tag_is_skipped() {
        let mut t = Transaction::new(Date::default(), "p", Money::ZERO);
        add_transaction_tag(&mut t, &tag(1, "old", "desc", true));
        assert!(t.annotations.is_empty());
    }

    #[test]
    fn test_tag_annotation_key_and_value() {
        let mut t = Transaction::new(Date::default(), "p", Money::ZERO);
        add_transaction_tag(&mut t, &tag(2, "food", "lunch", false));
        assert_eq!(t.annotation("tag:2"), Some("food: lunch"));
    }

    #[test]
    fn test_uncategorized_expense() {
        let cats = categorize(
            &[txn(1, 500000, 0, 0)],
            &CategoryIndex::default(),
            &TagIndex::default(),
        )
        .unwrap();
        let tree = cats.tree();

        let unc = child(tree, cats.expenses(), UNCATEGORIZED);
        assert_eq!(tree.category(unc).total_amount(), Money::from_units(500000));
        assert_eq!(
            tree.category(cats.expenses()).total_amount(),
            Money::from_units(500000)
        );
        assert_eq!(only_transaction(tree, unc).annotation(CATEGORY_ERROR), None);
        assert!(tree.category(cats.income()).subcategories().is_empty());
    }

    #[test]
    fn test_missing_category_group() {
        let cats = categorize(
            &[txn(1, 10000, 11, 99)],
            &reference_data(),
            &TagIndex::default(),
        )
        .unwrap();
        let tree = cats.tree();

        let unc = child(tree, cats.expenses(), UNCATEGORIZED);
        assert_eq!(
            only_transaction(tree, unc).annotation(CATEGORY_ERROR),
            Some("uncategorized due to invalid category group id")
        );
        assert_eq!(tree.category(cats.expenses()).subcategories(), &[unc]);
    }

    #[test]
    fn test_missing_category_without_group() {
        let cats = categorize(
            &[txn(1, 10000, 77, 0)],
            &reference_data(),
            &TagIndex::default(),
        )
        .unwrap();
        let tree = cats.tree();

        let unc = child(tree, cats.expenses(), UNCATEGORIZED);
        assert_eq!(
            only_transaction(tree, unc).annotation(CATEGORY_ERROR),
            Some("uncategorized due to invalid category id")
        );
    }

    #[test]
    fn test_missing_category_inside_group_stays_in_group() {
        let cats = categorize(
            &[txn(1, 10000, 77, 10)],
            &reference_data(),
            &TagIndex::default(),
        )
        .unwrap();
        let tree = cats.tree();

        let food = child(tree, cats.expenses(), "Food");
        let unc = child(tree, food, UNCATEGORIZED);
        assert_eq!(
            only_transaction(tree, unc).annotation(CATEGORY_ERROR),
            Some("uncategorized due to invalid category id")
        );
        assert_eq!(tree.category(food).total_amount(), Money::from_units(10000));
    }

    #[test]
    fn test_group_descent_copies_descriptions() {
        let cats = categorize(
            &[txn(1, 20000, 11, 10), txn(2, 30000, 12, 10), txn(3, 5000, 11, 10)],
            &reference_data(),
            &TagIndex::default(),
        )
        .unwrap();
        let tree = cats.tree();

        let food = child(tree, cats.expenses(), "Food");
        let groceries = child(tree, food, "Groceries");
        let restaurants = child(tree, food, "Restaurants");
        assert_eq!(tree.category(food).description, "all food");
        assert_eq!(tree.category(groceries).description, "food at home");
        assert_eq!(tree.category(groceries).transactions().len(), 2);
        assert_eq!(tree.category(groceries).total_amount(), Money::from_units(25000));
        assert_eq!(tree.category(restaurants).total_amount(), Money::from_units(30000));
        assert_eq!(tree.category(food).total_amount(), Money::from_units(55000));
        assert_eq!(
            tree.category(cats.expenses()).total_amount(),
            Money::from_units(55000)
        );
    }

    #[test]
    fn test_category_without_group_is_direct_child() {
        let cats = categorize(
            &[txn(1, 150000, 30, 0)],
            &reference_data(),
            &TagIndex::default(),
        )
        .unwrap();
        let tree = cats.tree();

        let rent = child(tree, cats.expenses(), "Rent");
        assert_eq!(tree.category(rent).description, "housing");
        assert_eq!(tree.category(rent).total_amount(), Money::from_units(150000));
    }

    #[test]
    fn test_group_named_like_bucket_does_not_descend() {
        let mut income = txn(1, 900000, 21, 20);
        income.is_income = true;

        let cats = categorize(&[income], &reference_data(), &TagIndex::default()).unwrap();
        let tree = cats.tree();

        let salary = child(tree, cats.income(), "Salary");
        assert!(tree.find_by_name(cats.income(), "Income").is_none());
        assert_eq!(tree.category(salary).total_amount(), Money::from_units(900000));
    }

    #[test]
    fn test_bucket_selection() {
        let mut income = txn(1, 100, 0, 0);
        income.is_income = true;
        income.exclude_from_totals = true;
        let mut budget_excluded = txn(2, 200, 0, 0);
        budget_excluded.exclude_from_budget = true;
        let mut totals_excluded = txn(3, 300, 0, 0);
        totals_excluded.exclude_from_totals = true;
        let expense = txn(4, 400, 0, 0);

        let cats = categorize(
            &[income, budget_excluded, totals_excluded, expense],
            &CategoryIndex::default(),
            &TagIndex::default(),
        )
        .unwrap();
        let tree = cats.tree();

        assert_eq!(tree.category(cats.income()).total_amount(), Money::from_units(100));
        assert_eq!(tree.category(cats.ignored()).total_amount(), Money::from_units(500));
        assert_eq!(tree.category(cats.expenses()).total_amount(), Money::from_units(400));
    }

    #[test]
    fn test_tags_on_categorized_transaction() {
        let mut t = txn(1, 100, 30, 0);
        t.tags = vec![TagRef { id: 1 }, TagRef { id: 2 }, TagRef { id: 404 }];
        let tags: TagIndex = [tag(1, "trip", "summer", false), tag(2, "old", "gone", true)]
            .into_iter()
            .collect();

        let cats = categorize(&[t], &reference_data(), &tags).unwrap();
        let tree = cats.tree();

        let filed = only_transaction(tree, child(tree, cats.expenses(), "Rent"));
        assert_eq!(filed.annotation("tag:1"), Some("trip: summer"));
        assert_eq!(filed.annotation("tag:2"), None);
        assert_eq!(filed.annotation("tag:404"), None);
        assert_eq!(filed.annotations.len(), 1);
    }

    #[test]
    fn test_invalid_date_aborts_run() {
        let mut bad = txn(2, 100, 0, 0);
        bad.date = "15/01/2024".to_string();

        let err = categorize(
            &[txn(1, 100, 0, 0), bad],
            &CategoryIndex::default(),
            &TagIndex::default(),
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::InvalidDate { ref value, .. } if value == "15/01/2024"));
    }

    #[test]
    fn test_sibling_groups_with_same_name_merge_into_first() {
        let index = CategoryIndex::from_nested(&[
            RawCategory {
                children: vec![category(11, "Groceries", "")],
                ..category(10, "Food", "first group")
            },
            RawCategory {
                children: vec![category(41, "Dining", "")],
                ..category(40, "Food", "second group")
            },
        ]);

        let cats = categorize(
            &[txn(1, 100, 11, 10), txn(2, 200, 41, 40)],
            &index,
            &TagIndex::default(),
        )
        .unwrap();
        let tree = cats.tree();

        let expenses = tree.category(cats.expenses());
        assert_eq!(expenses.subcategories().len(), 1);
        let food = expenses.subcategories()[0];
        assert_eq!(tree.category(food).description, "second group");
        assert_eq!(tree.category(food).subcategories().len(), 2);
        assert_eq!(tree.category(food).total_amount(), Money::from_units(300));
    }

    #[test]
    fn test_totals_match_transactions_everywhere() {
        let mut transactions = Vec::new();
        for i in 0..60 {
            let (cat, group) = [(0, 0), (11, 10), (12, 10), (30, 0), (77, 10), (11, 99)][i % 6];
            let mut t = txn(i as i64, (i as i64 * 37 % 1000) - 300, cat, group);
            t.is_income = i % 7 == 0;
            transactions.push(t);
        }

        let cats = categorize(&transactions, &reference_data(), &TagIndex::default()).unwrap();
        let tree = cats.tree();

        for bucket in Bucket::ALL {
            for (_, id) in tree.walk(cats.root(bucket)) {
                assert_eq!(tree.category(id).total_amount(), tree.subtree_sum(id));
            }
        }
        assert_eq!(tree.transaction_count(), 60);
    }

    struct MockTransactionSource {
        categories: Vec<RawCategory>,
        tags: Vec<RawTag>,
        transactions: Vec<RawTransaction>,
    }

    #[async_trait]
    impl TransactionSource for MockTransactionSource {
        async fn list_categories(&self) -> Result<CategoryIndex> {
            Ok(CategoryIndex::from_nested(&self.categories))
        }

        async fn list_tags(&self) -> Result<TagIndex> {
            Ok(self.tags.iter().cloned().collect())
        }

        async fn list_transactions(&self, _range: &DateRange) -> Result<Vec<RawTransaction>> {
            Ok(self.transactions.clone())
        }
    }

    #[tokio::test]
    async fn test_get_categorized_transactions_with_source() {
        let source = MockTransactionSource {
            categories: vec![category(30, "Rent", "housing")],
            tags: vec![tag(1, "home", "apartment", false)],
            transactions: vec![RawTransaction {
                tags: vec![TagRef { id: 1 }],
                ..txn(1, 120000, 30, 0)
            }],
        };
        let range = DateRange {
            start_date: Date::parse("2024-01-01").unwrap(),
            end_date: Date::parse("2024-01-31").unwrap(),
        };

        let cats = get_categorized_transactions(&source, &range).await.unwrap();
        let tree = cats.tree();

        let rent = child(tree, cats.expenses(), "Rent");
        assert_eq!(
            only_transaction(tree, rent).annotation("tag:1"),
            Some("home: apartment")
        );
    }

    #[tokio::test]
    async fn test_get_categorized_transactions_propagates_invalid_date() {
        let source = MockTransactionSource {
            categories: vec![],
            tags: vec![],
            transactions: vec![RawTransaction {
                date: "bogus".to_string(),
                ..Default::default()
            }],
        };
        let range = DateRange {
            start_date: Date::default(),
            end_date: Date::default(),
        };

        let err = get_categorized_transactions(&source, &range)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }
}
