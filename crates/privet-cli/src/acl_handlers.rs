//! Handler functions for the access-list commands.
//!
//! Each handler opens the configured metadata file, runs one operation
//! through the same code paths a storefront would use, prints a short
//! report, and returns the result so callers can inspect it.

use crate::cli::ListArgs;
use crate::config::PrivetConfig;
use privet_acl::{
    AccessList, AccessListStore, Catalog, DenyAll, Dispatcher, DispatcherBuilder,
    EditorSubmission, ItemId, JsonFileMetaStore, ListingPage, ListingQuery, RelatedRequest,
    RequestContext, SaveOutcome, TokenVerifier, Viewer, is_visible,
};
use privet_core::Result;
use privet_core::traits::ConfigProvider;

// ============================================================================
// Helpers
// ============================================================================

/// Open the metadata file named by the config.
fn open_meta(config: &PrivetConfig) -> Result<JsonFileMetaStore> {
    let path = config.data_path("meta")?;
    log::debug!("Using metadata file {}", path.display());
    JsonFileMetaStore::open(path)
}

/// Open the access-list store for direct reads.
fn open_store(config: &PrivetConfig) -> Result<AccessListStore<JsonFileMetaStore>> {
    Ok(AccessListStore::with_key(
        open_meta(config)?,
        config.access.meta_key.clone(),
    ))
}

/// Build a dispatcher with the standard stages for this config.
fn dispatcher<V>(config: &PrivetConfig, verifier: V) -> Result<Dispatcher<JsonFileMetaStore>>
where
    V: TokenVerifier + 'static,
{
    Ok(DispatcherBuilder::from_settings(open_meta(config)?, &config.access, verifier).build())
}

fn load_catalog(config: &PrivetConfig) -> Result<Catalog> {
    let path = config.data_path("catalog")?;
    log::debug!("Using catalog file {}", path.display());
    Catalog::load(path)
}

// ============================================================================
// Handlers
// ============================================================================

/// Print an item's access list.
pub fn handle_show(config: &PrivetConfig, item: &str) -> Result<AccessList> {
    let item = ItemId::new(item);
    let access = open_store(config)?.access_list(&item)?;
    println!("{item}: {access}");
    Ok(access)
}

/// Save an item's access list through the editor stage.
///
/// Without an explicit token one is minted from the configured secret, so
/// an operator holding the secret can save directly.
pub fn handle_save(
    config: &PrivetConfig,
    item: &str,
    viewers: Vec<String>,
    token: Option<String>,
) -> Result<SaveOutcome> {
    let item = ItemId::new(item);
    let verifier = config.token_verifier()?;
    let token = token.unwrap_or_else(|| verifier.issue(&item));

    let dispatcher = dispatcher(config, verifier)?;
    let ctx = RequestContext::admin(Viewer::Anonymous);
    let outcome = dispatcher.save(&ctx, item.clone(), EditorSubmission::new(viewers, token))?;

    match outcome {
        SaveOutcome::Stored(count) => {
            println!("{item}: restricted to {count} viewer(s)");
        }
        SaveOutcome::Cleared => println!("{item}: access list cleared, item is public"),
        SaveOutcome::Rejected => eprintln!("{item}: save rejected (token missing or invalid)"),
    }
    Ok(outcome)
}

/// Mint and print a verification token for an item.
pub fn handle_token(config: &PrivetConfig, item: &str) -> Result<String> {
    let token = config.token_verifier()?.issue(&ItemId::new(item));
    println!("{token}");
    Ok(token)
}

/// Evaluate visibility of an item for one viewer.
pub fn handle_check(config: &PrivetConfig, item: &str, viewer: Option<String>) -> Result<bool> {
    let item = ItemId::new(item);
    let viewer = Viewer::from_option(viewer);
    let access = open_store(config)?.access_list(&item)?;
    let visible = is_visible(&viewer, &access);

    println!(
        "{item} is {} to {viewer} ({access})",
        if visible { "visible" } else { "hidden" }
    );
    Ok(visible)
}

/// Run a listing through the dispatcher and print the page.
pub fn handle_list(config: &PrivetConfig, args: ListArgs) -> Result<ListingPage> {
    let catalog = load_catalog(config)?;
    let viewer = Viewer::from_option(args.viewer);
    let ctx = if args.admin {
        RequestContext::admin(viewer)
    } else {
        RequestContext::storefront(viewer)
    };
    let query = ListingQuery {
        post_type: Some(args.post_type),
        category: args.category,
        page: args.page,
        per_page: args.per_page,
        ..ListingQuery::default()
    };

    let page = dispatcher(config, DenyAll)?.list(&ctx, query, &catalog)?;

    println!(
        "Page {} ({} of {} match(es)):",
        page.page,
        page.items.len(),
        page.total
    );
    for item in &page.items {
        println!("  {item}");
    }
    Ok(page)
}

/// Filter related-item candidates and print the survivors.
pub fn handle_related(
    config: &PrivetConfig,
    item: &str,
    candidates: Vec<String>,
) -> Result<Vec<ItemId>> {
    let candidates = candidates.into_iter().map(ItemId::from).collect();
    let request = RelatedRequest::new(item, candidates);
    let ctx = RequestContext::storefront(Viewer::Anonymous);

    let kept = dispatcher(config, DenyAll)?.related(&ctx, request)?;
    for id in &kept {
        println!("{id}");
    }
    Ok(kept)
}

// ============================================================================
// Tests
// ============================================================================
