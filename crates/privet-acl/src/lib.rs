//! Access control for catalog items.
//!
//! An item is public unless it carries an allow-list of viewer ids. This
//! crate stores those allow-lists, decides visibility, and applies the rule
//! to catalog listings, related-item recommendations and editor saves.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        privet-acl                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  Dispatcher (stages run in fixed order)                  │
//! │  ├── CatalogQueryFilter   narrows listing queries        │
//! │  ├── RelatedItemsFilter   prunes recommendations         │
//! │  └── EditorGateway        applies verified saves         │
//! ├──────────────────────────────────────────────────────────┤
//! │  is_visible               the visibility predicate       │
//! │  ListingQuery / MetaQuery clause evaluation, pagination  │
//! ├──────────────────────────────────────────────────────────┤
//! │  AccessListStore          one metadata key per item      │
//! │  MetaStore trait                                         │
//! │  ├── MemoryMetaStore                                     │
//! │  └── JsonFileMetaStore                                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Public vs. Empty
//!
//! An item with no allow-list record is public. An item whose record exists
//! but lists nobody is hidden from everyone, including in listings. Editor
//! saves never create such a record (an empty selection deletes it), but
//! records written by other tools may be empty or unreadable, and those
//! keep the item hidden.

#![doc = include_str!("../README.md")]

pub mod codec;
pub mod editor;
pub mod filter;
pub mod meta;
pub mod pipeline;
pub mod predicate;
pub mod query;
pub mod related;
pub mod store;
pub mod types;

// Re-exports: types
pub use types::{AccessList, ItemId, RequestContext, Viewer, ViewerId, ViewerSet};

// Re-exports: storage
pub use meta::{JsonFileMetaStore, MemoryMetaStore, MetaDocument, MetaStore};
pub use store::{AccessListStore, DEFAULT_META_KEY};

// Re-exports: rules
pub use filter::CatalogQueryFilter;
pub use predicate::is_visible;
pub use query::{
    Catalog, CatalogEntry, ListingPage, ListingQuery, MetaClause, MetaCompare, MetaQuery,
    PRODUCT_POST_TYPE, Relation,
};
pub use related::{RelatedItemsFilter, RelatedMode, RelatedRequest};

// Re-exports: editor
pub use editor::{
    AllowAll, DEFAULT_TOKEN_ACTION, DenyAll, EditorGateway, EditorSubmission, KeyedTokenVerifier,
    SaveOutcome, TokenVerifier,
};

// Re-exports: dispatcher
pub use pipeline::{
    AccessSettings, Dispatcher, DispatcherBuilder, Exchange, Request, Response, SaveRequest,
    Stage, StageKind,
};
