//! Catalog listing queries with metadata clauses.
//!
//! A [`ListingQuery`] selects catalog entries by post type and category and
//! then narrows them by any number of attached [`MetaQuery`] groups. All
//! narrowing happens inside [`ListingQuery::execute`] before the page is
//! cut, so a restricted item never leaves a hole in a page.
//!
//! # Clause Groups
//!
//! - A group combines its clauses with [`Relation::And`] or [`Relation::Or`]
//! - Every attached group must hold (groups are ANDed together)
//! - An empty group places no constraint
//!
//! # Example
//!
//! ```
//! use privet_acl::{Catalog, CatalogEntry, ListingQuery, MemoryMetaStore, MetaClause, MetaQuery};
//!
//! let catalog = Catalog::from_entries(vec![
//!     CatalogEntry::product("p1"),
//!     CatalogEntry::product("p2"),
//! ]);
//! let meta = MemoryMetaStore::new();
//!
//! let mut query = ListingQuery::products();
//! query.add_meta_filter(MetaQuery::any(vec![MetaClause::not_exists("hidden")]));
//!
//! let page = query.execute(&catalog, &meta).unwrap();
//! assert_eq!(page.total, 2);
//! ```

use privet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codec;
use crate::meta::MetaStore;
use crate::types::{ItemId, ViewerId};

/// Post type of catalog products.
pub const PRODUCT_POST_TYPE: &str = "product";

// ============================================================================
// Metadata clauses
// ============================================================================

/// Comparison applied to one metadata key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum MetaCompare {
    /// The value decodes to an allow-list containing this exact viewer id.
    HasMember(ViewerId),
    /// The key has a value.
    Exists,
    /// The key has no value.
    NotExists,
}

/// A single condition on an item's metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaClause {
    /// Metadata key the clause reads.
    pub key: String,
    /// Comparison to apply.
    pub compare: MetaCompare,
}

impl MetaClause {
    /// Match items whose allow-list under `key` contains `viewer`.
    pub fn has_member(key: impl Into<String>, viewer: ViewerId) -> Self {
        Self {
            key: key.into(),
            compare: MetaCompare::HasMember(viewer),
        }
    }

    /// Match items that have a value under `key`.
    pub fn exists(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            compare: MetaCompare::Exists,
        }
    }

    /// Match items that have no value under `key`.
    pub fn not_exists(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            compare: MetaCompare::NotExists,
        }
    }

    /// Evaluate the clause for one item.
    pub fn matches<M: MetaStore + ?Sized>(&self, meta: &M, item: &ItemId) -> Result<bool> {
        let value = meta.get_meta(item, &self.key)?;
        Ok(match (&self.compare, value) {
            (MetaCompare::NotExists, value) => value.is_none(),
            (MetaCompare::Exists, value) => value.is_some(),
            (MetaCompare::HasMember(_), None) => false,
            (MetaCompare::HasMember(viewer), Some(raw)) => codec::decode(&raw).contains(viewer),
        })
    }
}

/// How clauses inside a group combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relation {
    /// Every clause must hold.
    #[default]
    And,
    /// At least one clause must hold.
    Or,
}

/// A group of metadata clauses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaQuery {
    /// How the clauses combine.
    pub relation: Relation,
    /// The clauses.
    pub clauses: Vec<MetaClause>,
}

impl MetaQuery {
    /// A group where every clause must hold.
    pub fn all(clauses: Vec<MetaClause>) -> Self {
        Self {
            relation: Relation::And,
            clauses,
        }
    }

    /// A group where any clause may hold.
    pub fn any(clauses: Vec<MetaClause>) -> Self {
        Self {
            relation: Relation::Or,
            clauses,
        }
    }

    /// Evaluate the group for one item.
    pub fn matches<M: MetaStore + ?Sized>(&self, meta: &M, item: &ItemId) -> Result<bool> {
        if self.clauses.is_empty() {
            return Ok(true);
        }
        match self.relation {
            Relation::And => {
                for clause in &self.clauses {
                    if !clause.matches(meta, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Relation::Or => {
                for clause in &self.clauses {
                    if clause.matches(meta, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// One entry of the catalog being listed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Item id.
    pub id: ItemId,
    /// Post type, e.g. `"product"`.
    #[serde(default = "default_post_type")]
    pub post_type: String,
    /// Category slugs the item belongs to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

fn default_post_type() -> String {
    PRODUCT_POST_TYPE.to_string()
}

impl CatalogEntry {
    /// A product entry with no categories.
    pub fn product(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            post_type: default_post_type(),
            categories: Vec::new(),
        }
    }

    /// An entry of another post type.
    pub fn of_type(id: impl Into<ItemId>, post_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            post_type: post_type.into(),
            categories: Vec::new(),
        }
    }

    /// Add a category slug.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }
}

/// Ordered catalog of items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Entries in listing order.
    #[serde(default)]
    pub items: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from entries.
    pub fn from_entries(items: Vec<CatalogEntry>) -> Self {
        Self { items }
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        serde_json::from_str(&json)
            .map_err(|e| Error::parse(format!("Failed to parse catalog {}: {e}", path.display())))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// ListingQuery
// ============================================================================

/// A catalog listing request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    /// Requested post type, if any.
    pub post_type: Option<String>,
    /// Requested product category. `Some("")` still marks the request as a
    /// category archive but does not narrow by category.
    pub category: Option<String>,
    /// Attached metadata groups; all must hold.
    #[serde(default)]
    pub meta_filters: Vec<MetaQuery>,
    /// 1-based page number.
    pub page: usize,
    /// Page size; `None` returns every match.
    pub per_page: Option<usize>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            post_type: None,
            category: None,
            meta_filters: Vec::new(),
            page: 1,
            per_page: None,
        }
    }
}

impl ListingQuery {
    /// A listing of the product collection.
    pub fn products() -> Self {
        Self {
            post_type: Some(PRODUCT_POST_TYPE.to_string()),
            ..Self::default()
        }
    }

    /// A product-category archive listing.
    pub fn category(slug: impl Into<String>) -> Self {
        Self {
            category: Some(slug.into()),
            ..Self::default()
        }
    }

    /// Set the post type.
    pub fn with_post_type(mut self, post_type: impl Into<String>) -> Self {
        self.post_type = Some(post_type.into());
        self
    }

    /// Set page and page size.
    pub fn with_page(mut self, page: usize, per_page: usize) -> Self {
        self.page = page;
        self.per_page = Some(per_page);
        self
    }

    /// Whether the request targets products or a product category.
    pub fn targets_products(&self) -> bool {
        self.post_type.as_deref() == Some(PRODUCT_POST_TYPE) || self.category.is_some()
    }

    /// Attach a metadata group that every listed item must satisfy.
    pub fn add_meta_filter(&mut self, filter: MetaQuery) {
        self.meta_filters.push(filter);
    }

    /// Run the query against a catalog.
    ///
    /// Entries are narrowed by post type, category and every metadata group
    /// first; the page is cut from what remains.
    pub fn execute<M: MetaStore + ?Sized>(&self, catalog: &Catalog, meta: &M) -> Result<ListingPage> {
        let mut matched = Vec::new();
        for entry in &catalog.items {
            if self.selects(entry) && self.passes_meta_filters(meta, &entry.id)? {
                matched.push(entry.id.clone());
            }
        }

        let total = matched.len();
        let page = self.page.max(1);
        let items = match self.per_page {
            Some(per_page) => matched
                .into_iter()
                .skip((page - 1).saturating_mul(per_page))
                .take(per_page)
                .collect(),
            None => matched,
        };

        Ok(ListingPage {
            items,
            total,
            page,
            per_page: self.per_page,
        })
    }

    fn selects(&self, entry: &CatalogEntry) -> bool {
        if let Some(post_type) = &self.post_type
            && &entry.post_type != post_type
        {
            return false;
        }
        match self.category.as_deref() {
            Some(slug) if !slug.is_empty() => entry.categories.iter().any(|c| c == slug),
            _ => true,
        }
    }

    fn passes_meta_filters<M: MetaStore + ?Sized>(&self, meta: &M, item: &ItemId) -> Result<bool> {
        for filter in &self.meta_filters {
            if !filter.matches(meta, item)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// One page of listing results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage {
    /// Item ids on this page, in catalog order.
    pub items: Vec<ItemId>,
    /// Total matches across all pages.
    pub total: usize,
    /// 1-based page number.
    pub page: usize,
    /// Page size, if paginated.
    pub per_page: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MemoryMetaStore;

    const KEY: &str = "restrict-user-list";

    fn ids(page: &ListingPage) -> Vec<&str> {
        page.items.iter().map(ItemId::as_str).collect()
    }

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::product("p1").with_category("shirts"),
            CatalogEntry::product("p2").with_category("hats"),
            CatalogEntry::of_type("post-1", "post"),
            CatalogEntry::product("p3").with_category("shirts"),
        ])
    }

    #[test]
    fn test_clause_has_member_exact() {
        let meta = MemoryMetaStore::new();
        let item = ItemId::new("p1");
        meta.update_meta(&item, KEY, r#"["12"]"#).unwrap();

        assert!(MetaClause::has_member(KEY, "12".into())
            .matches(&meta, &item)
            .unwrap());
        assert!(!MetaClause::has_member(KEY, "1".into())
            .matches(&meta, &item)
            .unwrap());
        assert!(!MetaClause::has_member(KEY, "2".into())
            .matches(&meta, &ItemId::new("p2"))
            .unwrap());
    }

    #[test]
    fn test_clause_exists_and_not_exists() {
        let meta = MemoryMetaStore::new();
        meta.update_meta(&"p1".into(), KEY, "[]").unwrap();

        assert!(MetaClause::exists(KEY).matches(&meta, &"p1".into()).unwrap());
        assert!(!MetaClause::not_exists(KEY).matches(&meta, &"p1".into()).unwrap());
        assert!(MetaClause::not_exists(KEY).matches(&meta, &"p2".into()).unwrap());
    }

    #[test]
    fn test_meta_query_relations() {
        let meta = MemoryMetaStore::new();
        let item = ItemId::new("p1");
        meta.update_meta(&item, KEY, r#"["5"]"#).unwrap();

        let either = MetaQuery::any(vec![
            MetaClause::has_member(KEY, "9".into()),
            MetaClause::exists(KEY),
        ]);
        assert!(either.matches(&meta, &item).unwrap());

        let both = MetaQuery::all(vec![
            MetaClause::has_member(KEY, "9".into()),
            MetaClause::exists(KEY),
        ]);
        assert!(!both.matches(&meta, &item).unwrap());

        assert!(MetaQuery::any(Vec::new()).matches(&meta, &item).unwrap());
    }

    #[test]
    fn test_execute_post_type_and_category() {
        let meta = MemoryMetaStore::new();

        let page = ListingQuery::products().execute(&catalog(), &meta).unwrap();
        assert_eq!(ids(&page), vec!["p1", "p2", "p3"]);

        let page = ListingQuery::category("shirts")
            .execute(&catalog(), &meta)
            .unwrap();
        assert_eq!(ids(&page), vec!["p1", "p3"]);

        let page = ListingQuery::default().execute(&catalog(), &meta).unwrap();
        assert_eq!(page.total, 4);
    }

    #[test]
    fn test_execute_empty_category_does_not_narrow() {
        let meta = MemoryMetaStore::new();
        let query = ListingQuery::category("");
        assert!(query.targets_products());
        assert_eq!(query.execute(&catalog(), &meta).unwrap().total, 4);
    }

    #[test]
    fn test_meta_filter_applies_before_pagination() {
        let meta = MemoryMetaStore::new();
        meta.update_meta(&"p1".into(), "hidden", "1").unwrap();

        let mut query = ListingQuery::products().with_page(1, 2);
        query.add_meta_filter(MetaQuery::all(vec![MetaClause::not_exists("hidden")]));

        let first = query.execute(&catalog(), &meta).unwrap();
        assert_eq!(ids(&first), vec!["p2", "p3"]);
        assert_eq!(first.total, 2);

        let second = query.with_page(2, 2).execute(&catalog(), &meta).unwrap();
        assert!(second.items.is_empty());
    }

    #[test]
    fn test_page_zero_treated_as_first() {
        let meta = MemoryMetaStore::new();
        let page = ListingQuery::products()
            .with_page(0, 1)
            .execute(&catalog(), &meta)
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(ids(&page), vec!["p1"]);
    }

    #[test]
    fn test_catalog_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"items": [
                {"id": "p1", "categories": ["shirts"]},
                {"id": "about", "post_type": "page"}
            ]}"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.items[0].post_type, "product");
        assert_eq!(catalog.items[1].post_type, "page");
    }

    #[test]
    fn test_catalog_load_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = Catalog::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, Error::IoWithPath { .. }));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[").unwrap();
        assert!(matches!(Catalog::load(&path).unwrap_err(), Error::Parse(_)));
    }

    #[test]
    fn test_meta_query_serializes() {
        let query = MetaQuery::any(vec![
            MetaClause::has_member(KEY, "5".into()),
            MetaClause::not_exists(KEY),
        ]);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["relation"], "OR");
        assert_eq!(json["clauses"][0]["compare"]["op"], "has_member");
        assert_eq!(json["clauses"][0]["compare"]["value"], "5");
        assert_eq!(json["clauses"][1]["compare"]["op"], "not_exists");
    }
}
