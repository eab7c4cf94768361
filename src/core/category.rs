//! Hierarchical buckets of transactions with running totals.
//!
//! Categories and transactions live in a [`CategoryTree`] arena and refer to
//! each other by index. Parent and category links are plain ids, so they
//! never own the node they point at.
//!
//! # Invariants
//! - Every category's `total_amount` equals the sum of all transaction
//!   amounts in the subtree rooted at it, after every mutation.
//! - A category is attached to at most one parent, once.
//! - A transaction is filed under at most one category, once.

use crate::core::annotations::{Annotated, Annotations};
use crate::core::error::CoreError;
use crate::core::money::Money;
use crate::core::transaction::Transaction;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(usize);

/// A named bucket holding transactions and nested subcategories.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    name: String,
    pub description: String,
    annotations: Annotations,
    total_amount: Money,
    parent: Option<CategoryId>,
    subcategories: Vec<CategoryId>,
    transactions: Vec<TransactionId>,
}

impl Category {
    fn new(name: String) -> Self {
        Self {
            name,
            description: String::new(),
            annotations: Annotations::new(),
            total_amount: Money::ZERO,
            parent: None,
            subcategories: Vec::new(),
            transactions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn parent(&self) -> Option<CategoryId> {
        self.parent
    }

    pub fn subcategories(&self) -> &[CategoryId] {
        &self.subcategories
    }

    pub fn transactions(&self) -> &[TransactionId] {
        &self.transactions
    }
}

impl Annotated for Category {
    fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}

/// Arena owning every category and transaction of one categorization run.
///
/// Ids are only meaningful for the tree that issued them; passing an id from
/// another tree panics on out-of-range access.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unattached category with a zero total.
    pub fn create_category(&mut self, name: impl Into<String>) -> CategoryId {
        self.categories.push(Category::new(name.into()));
        CategoryId(self.categories.len() - 1)
    }

    /// Moves a transaction into the arena without filing it anywhere.
    pub fn insert_transaction(&mut self, mut txn: Transaction) -> TransactionId {
        txn.category = None;
        self.transactions.push(txn);
        TransactionId(self.transactions.len() - 1)
    }

    pub fn category(&self, id: CategoryId) -> &Category {
        &self.categories[id.0]
    }

    /// Mutable access for description and annotations. Totals and links are
    /// only changed through the tree operations.
    pub fn category_mut(&mut self, id: CategoryId) -> &mut Category {
        &mut self.categories[id.0]
    }

    pub fn transaction(&self, id: TransactionId) -> &Transaction {
        &self.transactions[id.0]
    }

    pub fn annotate_transaction(
        &mut self,
        id: TransactionId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.transactions[id.0].annotate(key, value);
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Walks parent links up to the topmost ancestor.
    pub fn root_of(&self, id: CategoryId) -> CategoryId {
        let mut current = id;
        while let Some(parent) = self.categories[current.0].parent {
            current = parent;
        }
        current
    }

    /// Attaches `child` beneath `parent` and recomputes every total in the
    /// tree that now contains both.
    pub fn add_subcategory(
        &mut self,
        parent: CategoryId,
        child: CategoryId,
    ) -> Result<(), CoreError> {
        if let Some(current) = self.categories[child.0].parent {
            return Err(CoreError::AlreadyAttached {
                child: self.categories[child.0].name.clone(),
                current: self.categories[current.0].name.clone(),
                requested: self.categories[parent.0].name.clone(),
            });
        }
        // child is a root here, so it is an ancestor of parent only if it is
        // parent's root.
        let root = self.root_of(parent);
        if root == child {
            return Err(CoreError::WouldCycle {
                child: self.categories[child.0].name.clone(),
                parent: self.categories[parent.0].name.clone(),
            });
        }

        self.categories[parent.0].subcategories.push(child);
        self.categories[child.0].parent = Some(parent);
        self.recompute_totals(root);
        Ok(())
    }

    /// Files `txn` under `category` and adds its amount to the category and
    /// every ancestor.
    pub fn add_transaction(
        &mut self,
        category: CategoryId,
        txn: TransactionId,
    ) -> Result<(), CoreError> {
        if let Some(current) = self.transactions[txn.0].category {
            return Err(CoreError::AlreadyAssigned {
                current: self.categories[current.0].name.clone(),
                requested: self.categories[category.0].name.clone(),
            });
        }

        let amount = self.transactions[txn.0].amount;
        self.categories[category.0].transactions.push(txn);
        self.transactions[txn.0].category = Some(category);

        let mut node = Some(category);
        while let Some(id) = node {
            let c = &mut self.categories[id.0];
            c.total_amount += amount;
            node = c.parent;
        }
        Ok(())
    }

    /// First direct child of `parent` named `name`, in insertion order.
    pub fn find_by_name(&self, parent: CategoryId, name: &str) -> Option<CategoryId> {
        self.categories[parent.0]
            .subcategories
            .iter()
            .copied()
            .find(|id| self.categories[id.0].name == name)
    }

    pub fn find_or_create_by_name(
        &mut self,
        parent: CategoryId,
        name: &str,
    ) -> Result<CategoryId, CoreError> {
        if let Some(existing) = self.find_by_name(parent, name) {
            return Ok(existing);
        }
        let created = self.create_category(name);
        self.add_subcategory(parent, created)?;
        Ok(created)
    }

    /// Recalculates every total in the subtree rooted at `id` from the
    /// transactions it contains and returns the total of `id`.
    pub fn recompute_totals(&mut self, id: CategoryId) -> Money {
        let subcategories = self.categories[id.0].subcategories.clone();
        let mut total: Money = subcategories
            .into_iter()
            .map(|sub| self.recompute_totals(sub))
            .sum();
        total += self.categories[id.0]
            .transactions
            .iter()
            .map(|t| self.transactions[t.0].amount)
            .sum::<Money>();
        self.categories[id.0].total_amount = total;
        total
    }

    /// Sum of all transaction amounts under `id`, computed without relying on
    /// stored totals.
    pub fn subtree_sum(&self, id: CategoryId) -> Money {
        let node = &self.categories[id.0];
        let own: Money = node
            .transactions
            .iter()
            .map(|t| self.transactions[t.0].amount)
            .sum();
        own + node
            .subcategories
            .iter()
            .map(|sub| self.subtree_sum(*sub))
            .sum::<Money>()
    }

    /// Pre-order listing of the subtree rooted at `id`, with depth relative
    /// to `id`.
    pub fn walk(&self, id: CategoryId) -> Vec<(usize, CategoryId)> {
        let mut out = Vec::new();
        let mut stack = vec![(0, id)];
        while let Some((depth, current)) = stack.pop() {
            out.push((depth, current));
            for sub in self.categories[current.0].subcategories.iter().rev() {
                stack.push((depth + 1, *sub));
            }
        }
        out
    }

    fn load(&mut self, record: CategoryRecord, parent: Option<CategoryId>) -> CategoryId {
        let id = self.create_category(record.name);
        {
            let node = &mut self.categories[id.0];
            node.description = record.description;
            node.annotations = record.annotations;
            node.total_amount = record.total_amount;
            node.parent = parent;
        }
        for sub in record.subcategories {
            let child = self.load(sub, Some(id));
            self.categories[id.0].subcategories.push(child);
        }
        for txn in record.transactions {
            let txn_id = self.insert_transaction(txn);
            self.transactions[txn_id.0].category = Some(id);
            self.categories[id.0].transactions.push(txn_id);
        }
        id
    }
}

/// The three top-level roots every transaction is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Income,
    Expenses,
    Ignored,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Income, Bucket::Expenses, Bucket::Ignored];

    pub fn name(self) -> &'static str {
        match self {
            Bucket::Income => "Income",
            Bucket::Expenses => "Expenses",
            Bucket::Ignored => "Ignored",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Bucket::Income => "income",
            Bucket::Expenses => "expenses",
            Bucket::Ignored => "ignored",
        }
    }
}

/// Income, Expenses and Ignored trees sharing one arena.
#[derive(Debug, Clone)]
pub struct Categories {
    tree: CategoryTree,
    roots: [CategoryId; 3],
}

impl Default for Categories {
    fn default() -> Self {
        Self::new()
    }
}

impl Categories {
    pub fn new() -> Self {
        let mut tree = CategoryTree::new();
        let roots = Bucket::ALL.map(|bucket| tree.create_category(bucket.name()));
        Self { tree, roots }
    }

    pub fn root(&self, bucket: Bucket) -> CategoryId {
        match bucket {
            Bucket::Income => self.roots[0],
            Bucket::Expenses => self.roots[1],
            Bucket::Ignored => self.roots[2],
        }
    }

    pub fn income(&self) -> CategoryId {
        self.root(Bucket::Income)
    }

    pub fn expenses(&self) -> CategoryId {
        self.root(Bucket::Expenses)
    }

    pub fn ignored(&self) -> CategoryId {
        self.root(Bucket::Ignored)
    }

    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    pub fn create_category(&mut self, name: impl Into<String>) -> CategoryId {
        self.tree.create_category(name)
    }

    pub fn insert_transaction(&mut self, txn: Transaction) -> TransactionId {
        self.tree.insert_transaction(txn)
    }

    pub fn category_mut(&mut self, id: CategoryId) -> &mut Category {
        self.tree.category_mut(id)
    }

    /// Same as [`CategoryTree::add_subcategory`], but a bucket root can never
    /// become somebody's child.
    pub fn add_subcategory(
        &mut self,
        parent: CategoryId,
        child: CategoryId,
    ) -> Result<(), CoreError> {
        if self.roots.contains(&child) {
            return Err(CoreError::RootNotAttachable {
                root: self.tree.category(child).name.clone(),
                parent: self.tree.category(parent).name.clone(),
            });
        }
        self.tree.add_subcategory(parent, child)
    }

    pub fn add_transaction(
        &mut self,
        category: CategoryId,
        txn: TransactionId,
    ) -> Result<(), CoreError> {
        self.tree.add_transaction(category, txn)
    }

    pub fn find_or_create_by_name(
        &mut self,
        parent: CategoryId,
        name: &str,
    ) -> Result<CategoryId, CoreError> {
        self.tree.find_or_create_by_name(parent, name)
    }

    /// View that serializes totals and subcategories but no transactions.
    pub fn summary(&self) -> CategoriesSummary<'_> {
        CategoriesSummary(self)
    }

    fn from_record(record: CategoriesRecord) -> Self {
        let mut tree = CategoryTree::new();
        let roots = [
            (Bucket::Income, record.income),
            (Bucket::Expenses, record.expenses),
            (Bucket::Ignored, record.ignored),
        ]
        .map(|(bucket, root)| {
            let mut root = root.unwrap_or_default();
            if root.name.is_empty() {
                root.name = bucket.name().to_string();
            }
            tree.load(root, None)
        });

        let stored: Vec<Money> = tree.categories.iter().map(|c| c.total_amount).collect();
        for root in roots {
            tree.recompute_totals(root);
        }
        for (node, stored) in tree.categories.iter().zip(stored) {
            if node.total_amount != stored {
                warn!(
                    category = %node.name,
                    stored = %stored,
                    computed = %node.total_amount,
                    "Stored category total disagrees with its transactions"
                );
            }
        }

        Self { tree, roots }
    }

    fn serialize_with<S: Serializer>(
        &self,
        serializer: S,
        with_transactions: bool,
    ) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Categories", 3)?;
        for bucket in Bucket::ALL {
            s.serialize_field(
                bucket.key(),
                &CategoryView {
                    tree: &self.tree,
                    id: self.root(bucket),
                    with_transactions,
                },
            )?;
        }
        s.end()
    }
}

pub struct CategoriesSummary<'a>(&'a Categories);

impl Serialize for CategoriesSummary<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize_with(serializer, false)
    }
}

impl Serialize for Categories {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serialize_with(serializer, true)
    }
}

impl<'de> Deserialize<'de> for Categories {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        CategoriesRecord::deserialize(deserializer).map(Categories::from_record)
    }
}

struct CategoryView<'a> {
    tree: &'a CategoryTree,
    id: CategoryId,
    with_transactions: bool,
}

impl Serialize for CategoryView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.tree.category(self.id);
        let mut s = serializer.serialize_struct("Category", 6)?;
        s.serialize_field("name", &node.name)?;
        if node.description.is_empty() {
            s.skip_field("description")?;
        } else {
            s.serialize_field("description", &node.description)?;
        }
        if node.annotations.is_empty() {
            s.skip_field("annotations")?;
        } else {
            s.serialize_field("annotations", &node.annotations)?;
        }
        s.serialize_field("total_amount", &node.total_amount)?;
        if node.subcategories.is_empty() {
            s.skip_field("subcategories")?;
        } else {
            let subs: Vec<CategoryView> = node
                .subcategories
                .iter()
                .map(|id| CategoryView {
                    tree: self.tree,
                    id: *id,
                    with_transactions: self.with_transactions,
                })
                .collect();
            s.serialize_field("subcategories", &subs)?;
        }
        if !self.with_transactions || node.transactions.is_empty() {
            s.skip_field("transactions")?;
        } else {
            let txns: Vec<&Transaction> = node
                .transactions
                .iter()
                .map(|id| self.tree.transaction(*id))
                .collect();
            s.serialize_field("transactions", &txns)?;
        }
        s.end()
    }
}

#[derive(Debug, Default, Deserialize)]
struct CategoryRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    annotations: Annotations,
    #[serde(default)]
    total_amount: Money,
    #[serde(default)]
    subcategories: Vec<CategoryRecord>,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
struct CategoriesRecord {
    #[serde(default)]
    income: Option<CategoryRecord>,
    #[serde(default)]
    expenses: Option<CategoryRecord>,
    #[serde(default)]
    ignored: Option<CategoryRecord>,
}
