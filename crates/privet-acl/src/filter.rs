//! Catalog listing filter.
//!
//! Narrows storefront product listings so that restricted items only show up
//! for the viewers on their allow-list. The narrowing is attached to the
//! query as a metadata group, so it runs before pagination.

use crate::query::{ListingQuery, MetaClause, MetaQuery};
use crate::store::DEFAULT_META_KEY;
use crate::types::{RequestContext, Viewer};

/// Attaches the visibility rule to in-scope listing queries.
#[derive(Clone, Debug)]
pub struct CatalogQueryFilter {
    key: String,
}

impl Default for CatalogQueryFilter {
    fn default() -> Self {
        Self::new(DEFAULT_META_KEY)
    }
}

impl CatalogQueryFilter {
    /// Create a filter reading allow-lists under `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Whether a request should be narrowed.
    ///
    /// Only non-admin requests for the product collection or a product
    /// category archive are in scope.
    pub fn in_scope(ctx: &RequestContext, query: &ListingQuery) -> bool {
        !ctx.admin && query.targets_products()
    }

    /// The metadata group expressing "this viewer may see the item".
    ///
    /// `OR(allow-list contains viewer, no allow-list)`. An anonymous viewer
    /// can only ever satisfy the second clause. An allow-list that exists
    /// but is empty satisfies neither, so such items are hidden from all.
    pub fn visibility_clause(&self, viewer: &Viewer) -> MetaQuery {
        let mut clauses = Vec::with_capacity(2);
        if let Some(id) = viewer.id() {
            clauses.push(MetaClause::has_member(&self.key, id.clone()));
        }
        clauses.push(MetaClause::not_exists(&self.key));
        MetaQuery::any(clauses)
    }

    /// Narrow `query` for the request's viewer if it is in scope.
    ///
    /// Returns whether the query was changed.
    pub fn apply(&self, ctx: &RequestContext, query: &mut ListingQuery) -> bool {
        if !Self::in_scope(ctx, query) {
            log::trace!("Listing query out of scope, passing through");
            return false;
        }
        log::debug!("Narrowing product listing for {}", ctx.viewer);
        query.add_meta_filter(self.visibility_clause(&ctx.viewer));
        true
    }
}
