//! Request dispatching through registered stages.
//!
//! Stages are registered once, at startup, on a [`DispatcherBuilder`]. Every
//! request then passes through the registered stages in a fixed order
//! (query filter, related items, save), whatever order they were
//! registered in. Each stage only touches the request kind it handles.
//!
//! A stage that is not registered leaves its request kind untouched:
//! listings are not narrowed, related candidates pass through, and saves
//! are rejected.
//!
//! # Example
//!
//! ```
//! use privet_acl::{
//!     AccessListStore, AllowAll, CatalogQueryFilter, DispatcherBuilder, EditorGateway,
//!     ListingQuery, MemoryMetaStore, Request, RequestContext, Viewer,
//! };
//!
//! let dispatcher = DispatcherBuilder::new(AccessListStore::new(MemoryMetaStore::new()))
//!     .with_editor(EditorGateway::new(AllowAll))
//!     .with_query_filter(CatalogQueryFilter::default())
//!     .build();
//!
//! assert_eq!(dispatcher.stages(), vec!["query-filter", "save"]);
//!
//! let ctx = RequestContext::storefront(Viewer::Anonymous);
//! let response = dispatcher
//!     .dispatch(&ctx, Request::Listing(ListingQuery::products()))
//!     .unwrap();
//! assert!(response.into_listing().is_some());
//! ```

use privet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::editor::{EditorGateway, EditorSubmission, SaveOutcome, TokenVerifier};
use crate::filter::CatalogQueryFilter;
use crate::meta::MetaStore;
use crate::query::{Catalog, ListingPage, ListingQuery};
use crate::related::{RelatedItemsFilter, RelatedMode, RelatedRequest};
use crate::store::{AccessListStore, DEFAULT_META_KEY};
use crate::types::{ItemId, RequestContext};

// ============================================================================
// Settings
// ============================================================================

/// Access-control settings an application hands to the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSettings {
    /// Metadata key holding allow-lists.
    pub meta_key: String,
    /// How the related-items stage is wired.
    pub related_mode: RelatedMode,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            meta_key: DEFAULT_META_KEY.to_string(),
            related_mode: RelatedMode::default(),
        }
    }
}

// ============================================================================
// Requests and responses
// ============================================================================

/// A save request from the editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Item being edited.
    pub item: ItemId,
    /// What the form posted.
    pub submission: EditorSubmission,
}

/// Incoming request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// A catalog listing.
    Listing(ListingQuery),
    /// Related-items candidates to prune.
    Related(RelatedRequest),
    /// An editor save.
    Save(SaveRequest),
}

/// Result of dispatching a [`Request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// The listing query, narrowed if a stage applied.
    Listing(ListingQuery),
    /// Surviving related-item candidates.
    Related(Vec<ItemId>),
    /// Outcome of the save.
    Save(SaveOutcome),
}

impl Response {
    /// The listing query, if this is a listing response.
    pub fn into_listing(self) -> Option<ListingQuery> {
        match self {
            Self::Listing(query) => Some(query),
            _ => None,
        }
    }

    /// The related candidates, if this is a related response.
    pub fn into_related(self) -> Option<Vec<ItemId>> {
        match self {
            Self::Related(items) => Some(items),
            _ => None,
        }
    }

    /// The save outcome, if this is a save response.
    pub fn into_save(self) -> Option<SaveOutcome> {
        match self {
            Self::Save(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// A request on its way through the stages.
#[derive(Debug)]
pub enum Exchange {
    /// Listing query being narrowed.
    Listing(ListingQuery),
    /// Related candidates being pruned.
    Related(RelatedRequest),
    /// Save waiting for a stage to apply it.
    Save {
        /// The request.
        request: SaveRequest,
        /// Set by the stage that handled the save.
        outcome: Option<SaveOutcome>,
    },
}

impl From<Request> for Exchange {
    fn from(request: Request) -> Self {
        match request {
            Request::Listing(query) => Self::Listing(query),
            Request::Related(related) => Self::Related(related),
            Request::Save(request) => Self::Save {
                request,
                outcome: None,
            },
        }
    }
}

impl From<Exchange> for Response {
    fn from(exchange: Exchange) -> Self {
        match exchange {
            Exchange::Listing(query) => Self::Listing(query),
            Exchange::Related(related) => Self::Related(related.candidates),
            Exchange::Save { outcome, .. } => Self::Save(outcome.unwrap_or(SaveOutcome::Rejected)),
        }
    }
}

// ============================================================================
// Stages
// ============================================================================

/// The stage slots, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    /// Narrows listing queries.
    QueryFilter,
    /// Prunes related-item candidates.
    RelatedItems,
    /// Applies editor saves.
    Save,
}

impl StageKind {
    /// Stable stage name.
    pub fn name(self) -> &'static str {
        match self {
            Self::QueryFilter => "query-filter",
            Self::RelatedItems => "related-items",
            Self::Save => "save",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of request processing.
pub trait Stage<M>: Send + Sync {
    /// Which slot this stage fills.
    fn kind(&self) -> StageKind;

    /// Process the exchange in place. Stages ignore request kinds they do
    /// not handle.
    fn process(
        &self,
        ctx: &RequestContext,
        store: &AccessListStore<M>,
        exchange: &mut Exchange,
    ) -> Result<()>;
}

impl<M: MetaStore> Stage<M> for CatalogQueryFilter {
    fn kind(&self) -> StageKind {
        StageKind::QueryFilter
    }

    fn process(
        &self,
        ctx: &RequestContext,
        _store: &AccessListStore<M>,
        exchange: &mut Exchange,
    ) -> Result<()> {
        if let Exchange::Listing(query) = exchange {
            self.apply(ctx, query);
        }
        Ok(())
    }
}

impl<M: MetaStore> Stage<M> for RelatedItemsFilter {
    fn kind(&self) -> StageKind {
        StageKind::RelatedItems
    }

    fn process(
        &self,
        _ctx: &RequestContext,
        store: &AccessListStore<M>,
        exchange: &mut Exchange,
    ) -> Result<()> {
        if let Exchange::Related(related) = exchange {
            related.candidates = self.apply(store, related.clone())?;
        }
        Ok(())
    }
}

impl<M: MetaStore, V: TokenVerifier> Stage<M> for EditorGateway<V> {
    fn kind(&self) -> StageKind {
        StageKind::Save
    }

    fn process(
        &self,
        _ctx: &RequestContext,
        store: &AccessListStore<M>,
        exchange: &mut Exchange,
    ) -> Result<()> {
        if let Exchange::Save { request, outcome } = exchange {
            if outcome.is_none() {
                *outcome = Some(self.save(store, &request.item, &request.submission)?);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Registers stages at startup.
pub struct DispatcherBuilder<M> {
    store: AccessListStore<M>,
    stages: Vec<Box<dyn Stage<M>>>,
}

impl<M: MetaStore + 'static> DispatcherBuilder<M> {
    /// Start with no stages.
    pub fn new(store: AccessListStore<M>) -> Self {
        Self {
            store,
            stages: Vec::new(),
        }
    }

    /// Register the standard stages for `settings`.
    ///
    /// The query filter and save stages are always registered. The
    /// related-items stage is registered only in
    /// [`RelatedMode::StripRestricted`].
    pub fn from_settings<V>(meta: M, settings: &AccessSettings, verifier: V) -> Self
    where
        V: TokenVerifier + 'static,
    {
        let builder = Self::new(AccessListStore::with_key(meta, settings.meta_key.clone()))
            .with_query_filter(CatalogQueryFilter::new(settings.meta_key.clone()))
            .with_editor(EditorGateway::new(verifier));

        match settings.related_mode {
            RelatedMode::StripRestricted => builder.with_related_items(RelatedItemsFilter::new()),
            RelatedMode::Disconnected => {
                log::info!("Related-items stage not registered; recommendations are unfiltered");
                builder
            }
        }
    }

    /// Register any stage. A stage of the same kind replaces the earlier one.
    pub fn with_stage(mut self, stage: impl Stage<M> + 'static) -> Self {
        let kind = stage.kind();
        self.stages.retain(|s| s.kind() != kind);
        self.stages.push(Box::new(stage));
        self
    }

    /// Register the listing filter.
    pub fn with_query_filter(self, filter: CatalogQueryFilter) -> Self {
        self.with_stage(filter)
    }

    /// Register the related-items filter.
    pub fn with_related_items(self, filter: RelatedItemsFilter) -> Self {
        self.with_stage(filter)
    }

    /// Register the editor save stage.
    pub fn with_editor<V: TokenVerifier + 'static>(self, gateway: EditorGateway<V>) -> Self {
        self.with_stage(gateway)
    }

    /// Freeze the stage list.
    pub fn build(mut self) -> Dispatcher<M> {
        self.stages.sort_by_key(|s| s.kind());
        let dispatcher = Dispatcher {
            store: self.store,
            stages: self.stages,
        };
        log::debug!("Dispatcher stages: {:?}", dispatcher.stages());
        dispatcher
    }
}

/// Runs requests through the registered stages.
pub struct Dispatcher<M> {
    store: AccessListStore<M>,
    stages: Vec<Box<dyn Stage<M>>>,
}

impl<M: MetaStore> Dispatcher<M> {
    /// Names of the registered stages, in execution order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.kind().name()).collect()
    }

    /// Whether a stage of `kind` is registered.
    pub fn has_stage(&self, kind: StageKind) -> bool {
        self.stages.iter().any(|s| s.kind() == kind)
    }

    /// The access-list store stages operate on.
    pub fn store(&self) -> &AccessListStore<M> {
        &self.store
    }

    /// Run one request through every stage.
    pub fn dispatch(&self, ctx: &RequestContext, request: Request) -> Result<Response> {
        let mut exchange = Exchange::from(request);
        for stage in &self.stages {
            stage.process(ctx, &self.store, &mut exchange)?;
        }
        Ok(Response::from(exchange))
    }

    /// Dispatch a listing and execute it against `catalog`.
    pub fn list(
        &self,
        ctx: &RequestContext,
        query: ListingQuery,
        catalog: &Catalog,
    ) -> Result<ListingPage> {
        let query = self
            .dispatch(ctx, Request::Listing(query))?
            .into_listing()
            .ok_or_else(|| Error::operation("listing request produced a non-listing response"))?;
        query.execute(catalog, self.store.meta())
    }

    /// Dispatch a related-items request.
    pub fn related(&self, ctx: &RequestContext, request: RelatedRequest) -> Result<Vec<ItemId>> {
        self.dispatch(ctx, Request::Related(request))?
            .into_related()
            .ok_or_else(|| Error::operation("related request produced a non-related response"))
    }

    /// Dispatch an editor save.
    pub fn save(
        &self,
        ctx: &RequestContext,
        item: ItemId,
        submission: EditorSubmission,
    ) -> Result<SaveOutcome> {
        self.dispatch(ctx, Request::Save(SaveRequest { item, submission }))?
            .into_save()
            .ok_or_else(|| Error::operation("save request produced a non-save response"))
    }
}

impl<M> fmt::Debug for Dispatcher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<StageKind> = self.stages.iter().map(|s| s.kind()).collect();
        f.debug_struct("Dispatcher").field("stages", &stages).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{AllowAll, DenyAll};
    use crate::meta::MemoryMetaStore;
    use crate::query::CatalogEntry;
    use crate::types::Viewer;

    fn ids(list: &[&str]) -> Vec<ItemId> {
        list.iter().map(|id| ItemId::new(*id)).collect()
    }

    fn seeded_meta() -> MemoryMetaStore {
        let meta = MemoryMetaStore::new();
        meta.update_meta(&"B".into(), DEFAULT_META_KEY, r#"["5"]"#)
            .unwrap();
        meta
    }

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::product("A"),
            CatalogEntry::product("B"),
            CatalogEntry::product("C"),
        ])
    }

    #[test]
    fn test_stages_run_in_fixed_order() {
        let dispatcher = DispatcherBuilder::new(AccessListStore::new(MemoryMetaStore::new()))
            .with_editor(EditorGateway::new(AllowAll))
            .with_related_items(RelatedItemsFilter::new())
            .with_query_filter(CatalogQueryFilter::default())
            .build();
        assert_eq!(
            dispatcher.stages(),
            vec!["query-filter", "related-items", "save"]
        );
    }

    #[test]
    fn test_registering_twice_replaces() {
        let dispatcher = DispatcherBuilder::new(AccessListStore::new(MemoryMetaStore::new()))
            .with_editor(EditorGateway::new(DenyAll))
            .with_editor(EditorGateway::new(AllowAll))
            .build();
        assert_eq!(dispatcher.stages(), vec!["save"]);

        let outcome = dispatcher
            .save(
                &RequestContext::default(),
                "p1".into(),
                EditorSubmission::new(vec!["1".into()], "t"),
            )
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Stored(1));
    }

    #[test]
    fn test_from_settings_strip_restricted() {
        let dispatcher =
            DispatcherBuilder::from_settings(seeded_meta(), &AccessSettings::default(), AllowAll)
                .build();
        assert!(dispatcher.has_stage(StageKind::RelatedItems));

        let kept = dispatcher
            .related(
                &RequestContext::storefront(Viewer::identified("5")),
                RelatedRequest::new("X", ids(&["A", "B", "C"])),
            )
            .unwrap();
        assert_eq!(kept, ids(&["A", "C"]));
    }

    #[test]
    fn test_from_settings_disconnected() {
        let settings = AccessSettings {
            related_mode: RelatedMode::Disconnected,
            ..AccessSettings::default()
        };
        let dispatcher = DispatcherBuilder::from_settings(seeded_meta(), &settings, AllowAll).build();
        assert!(!dispatcher.has_stage(StageKind::RelatedItems));
        assert_eq!(dispatcher.stages(), vec!["query-filter", "save"]);

        let kept = dispatcher
            .related(
                &RequestContext::storefront(Viewer::Anonymous),
                RelatedRequest::new("X", ids(&["A", "B", "C"])),
            )
            .unwrap();
        assert_eq!(kept, ids(&["A", "B", "C"]));
    }

    #[test]
    fn test_related_request_with_args() {
        let dispatcher =
            DispatcherBuilder::from_settings(seeded_meta(), &AccessSettings::default(), AllowAll)
                .build();
        let response = dispatcher
            .dispatch(
                &RequestContext::default(),
                Request::Related(RelatedRequest::new("X", ids(&["B"])).with_arg("limit", "3")),
            )
            .unwrap();
        assert_eq!(response, Response::Related(Vec::new()));
    }

    #[test]
    fn test_list_through_dispatcher() {
        let dispatcher =
            DispatcherBuilder::from_settings(seeded_meta(), &AccessSettings::default(), AllowAll)
                .build();

        let anon = dispatcher
            .list(
                &RequestContext::storefront(Viewer::Anonymous),
                ListingQuery::products(),
                &catalog(),
            )
            .unwrap();
        assert_eq!(anon.items, ids(&["A", "C"]));

        let five = dispatcher
            .list(
                &RequestContext::storefront(Viewer::identified("5")),
                ListingQuery::products(),
                &catalog(),
            )
            .unwrap();
        assert_eq!(five.items, ids(&["A", "B", "C"]));

        let admin = dispatcher
            .list(
                &RequestContext::admin(Viewer::Anonymous),
                ListingQuery::products(),
                &catalog(),
            )
            .unwrap();
        assert_eq!(admin.total, 3);
    }

    #[test]
    fn test_without_query_filter_listing_unchanged() {
        let dispatcher = DispatcherBuilder::new(AccessListStore::new(seeded_meta())).build();
        let response = dispatcher
            .dispatch(
                &RequestContext::storefront(Viewer::Anonymous),
                Request::Listing(ListingQuery::products()),
            )
            .unwrap();
        assert_eq!(response, Response::Listing(ListingQuery::products()));
    }

    #[test]
    fn test_without_save_stage_rejects() {
        let dispatcher = DispatcherBuilder::new(AccessListStore::new(MemoryMetaStore::new())).build();
        let outcome = dispatcher
            .save(
                &RequestContext::admin(Viewer::identified("1")),
                "p1".into(),
                EditorSubmission::new(vec!["1".into()], "t"),
            )
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Rejected);
        assert_eq!(dispatcher.store().get(&"p1".into()).unwrap(), None);
    }

    #[test]
    fn test_custom_meta_key_used_by_all_stages() {
        let settings = AccessSettings {
            meta_key: "_private_to".into(),
            ..AccessSettings::default()
        };
        let dispatcher =
            DispatcherBuilder::from_settings(MemoryMetaStore::new(), &settings, AllowAll).build();
        let ctx = RequestContext::admin(Viewer::identified("1"));

        dispatcher
            .save(&ctx, "B".into(), EditorSubmission::new(vec!["9".into()], "t"))
            .unwrap();
        assert!(dispatcher
            .store()
            .meta()
            .get_meta(&"B".into(), "_private_to")
            .unwrap()
            .is_some());

        let page = dispatcher
            .list(
                &RequestContext::storefront(Viewer::Anonymous),
                ListingQuery::products(),
                &catalog(),
            )
            .unwrap();
        assert_eq!(page.items, ids(&["A", "C"]));
    }

    #[test]
    fn test_dispatcher_debug_lists_stages() {
        let dispatcher =
            DispatcherBuilder::from_settings(MemoryMetaStore::new(), &AccessSettings::default(), AllowAll)
                .build();
        let debug = format!("{dispatcher:?}");
        assert!(debug.contains("QueryFilter"));
        assert!(debug.contains("Save"));
    }

    #[test]
    fn test_access_settings_serde() {
        let settings: AccessSettings =
            serde_json::from_str(r#"{"related_mode": "disconnected"}"#).unwrap();
        assert_eq!(settings.meta_key, DEFAULT_META_KEY);
        assert_eq!(settings.related_mode, RelatedMode::Disconnected);
    }
}
