//! Applying editor submissions.
//!
//! The back-office form posts the selected viewer ids plus a verification
//! token. Rendering the form is not this crate's business; turning a
//! submission into a store mutation is.
//!
//! # Save Rules
//!
//! 1. Missing or unverifiable token: nothing changes, [`SaveOutcome::Rejected`]
//! 2. Empty selection (or only blanks): record deleted, item public again
//! 3. Otherwise: ids are trimmed, deduplicated and stored

use privet_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::meta::MetaStore;
use crate::store::AccessListStore;
use crate::types::{ItemId, ViewerId, ViewerSet};

/// Action name bound into tokens when none is configured.
pub const DEFAULT_TOKEN_ACTION: &str = "privet-save-access-list";

const KEY_CONTEXT: &str = "privet 2026-10-16 access-list editor tokens v1";

// ============================================================================
// Token verification
// ============================================================================

/// Decides whether a submission's token authorizes a save for an item.
pub trait TokenVerifier: Send + Sync {
    /// Whether `token` authorizes saving `item`.
    fn verify(&self, item: &ItemId, token: &str) -> bool;
}

/// Accepts every token. For trusted local tooling and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl TokenVerifier for AllowAll {
    fn verify(&self, _item: &ItemId, _token: &str) -> bool {
        true
    }
}

/// Rejects every token.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenyAll;

impl TokenVerifier for DenyAll {
    fn verify(&self, _item: &ItemId, _token: &str) -> bool {
        false
    }
}

/// Tokens derived from a shared secret with a BLAKE3 keyed hash.
///
/// A token is the hex digest of `"<action>:<item id>"` under a key derived
/// from the secret, so it only authorizes saves for the item it was issued
/// for.
#[derive(Clone)]
pub struct KeyedTokenVerifier {
    key: [u8; 32],
    action: String,
}

impl KeyedTokenVerifier {
    /// Create a verifier from a shared secret and action name.
    pub fn new(secret: &str, action: impl Into<String>) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            action: action.into(),
        }
    }

    /// Create a verifier bound to [`DEFAULT_TOKEN_ACTION`].
    pub fn with_secret(secret: &str) -> Self {
        Self::new(secret, DEFAULT_TOKEN_ACTION)
    }

    /// Mint a token for `item`.
    pub fn issue(&self, item: &ItemId) -> String {
        self.digest(item).to_hex().to_string()
    }

    fn digest(&self, item: &ItemId) -> blake3::Hash {
        let message = format!("{}:{}", self.action, item);
        blake3::keyed_hash(&self.key, message.as_bytes())
    }
}

impl TokenVerifier for KeyedTokenVerifier {
    fn verify(&self, item: &ItemId, token: &str) -> bool {
        // Hash equality is constant-time.
        blake3::Hash::from_hex(token.trim())
            .map(|given| given == self.digest(item))
            .unwrap_or(false)
    }
}

impl fmt::Debug for KeyedTokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedTokenVerifier")
            .field("action", &self.action)
            .field("key", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Submission
// ============================================================================

/// What the editor form posted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSubmission {
    /// Selected viewer ids; `None` when the field was not posted at all.
    pub selection: Option<Vec<String>>,
    /// Verification token.
    pub token: Option<String>,
}

impl EditorSubmission {
    /// A submission with a selection and token.
    pub fn new(selection: Vec<String>, token: impl Into<String>) -> Self {
        Self {
            selection: Some(selection),
            token: Some(token.into()),
        }
    }

    /// The cleaned-up selection: trimmed, non-blank, deduplicated.
    pub fn viewers(&self) -> ViewerSet {
        self.selection
            .iter()
            .flatten()
            .map(|raw| raw.trim())
            .filter(|id| !id.is_empty())
            .map(ViewerId::new)
            .collect()
    }
}

/// Result of a save attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "viewers")]
pub enum SaveOutcome {
    /// The allow-list was stored with this many viewers.
    Stored(usize),
    /// The allow-list was removed; the item is public.
    Cleared,
    /// Token missing or invalid; nothing changed.
    Rejected,
}

impl SaveOutcome {
    /// Whether the store was touched.
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Turns verified submissions into access-list mutations.
#[derive(Debug)]
pub struct EditorGateway<V> {
    verifier: V,
}

impl<V: TokenVerifier> EditorGateway<V> {
    /// Create a gateway using `verifier` to check tokens.
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// The token verifier.
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Apply a submission for `item`.
    ///
    /// A bad token is not an error: it yields [`SaveOutcome::Rejected`] and
    /// leaves the store untouched. Only store failures are returned as `Err`.
    pub fn save<M: MetaStore>(
        &self,
        store: &AccessListStore<M>,
        item: &ItemId,
        submission: &EditorSubmission,
    ) -> Result<SaveOutcome> {
        let authorized = submission
            .token
            .as_deref()
            .is_some_and(|token| self.verifier.verify(item, token));
        if !authorized {
            log::debug!("Dropping access-list save for {item}: token missing or invalid");
            return Ok(SaveOutcome::Rejected);
        }

        let viewers = submission.viewers();
        if viewers.is_empty() {
            store.delete(item)?;
            return Ok(SaveOutcome::Cleared);
        }

        store.set(item, &viewers)?;
        Ok(SaveOutcome::Stored(viewers.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MemoryMetaStore;

    fn selection(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn store_with(item: &str, ids: &[&str]) -> AccessListStore<MemoryMetaStore> {
        let store = AccessListStore::new(MemoryMetaStore::new());
        let set: ViewerSet = ids.iter().map(|id| ViewerId::new(*id)).collect();
        store.set(&item.into(), &set).unwrap();
        store
    }

    #[test]
    fn test_save_stores_selection() {
        let store = AccessListStore::new(MemoryMetaStore::new());
        let gateway = EditorGateway::new(AllowAll);
        let item = ItemId::new("p1");

        let outcome = gateway
            .save(&store, &item, &EditorSubmission::new(selection(&["5", "12"]), "t"))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Stored(2));
        assert_eq!(store.get(&item).unwrap().map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_save_cleans_selection() {
        let store = AccessListStore::new(MemoryMetaStore::new());
        let gateway = EditorGateway::new(AllowAll);
        let item = ItemId::new("p1");

        let outcome = gateway
            .save(
                &store,
                &item,
                &EditorSubmission::new(selection(&[" 5 ", "5", "", "  "]), "t"),
            )
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Stored(1));
        assert_eq!(
            store.get(&item).unwrap(),
            Some([ViewerId::new("5")].into_iter().collect())
        );
    }

    #[test]
    fn test_empty_selection_deletes_record() {
        let store = store_with("p1", &["5"]);
        let gateway = EditorGateway::new(AllowAll);

        let outcome = gateway
            .save(&store, &"p1".into(), &EditorSubmission::new(Vec::new(), "t"))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Cleared);
        assert_eq!(store.get(&"p1".into()).unwrap(), None);
    }

    #[test]
    fn test_missing_field_deletes_record() {
        let store = store_with("p1", &["5"]);
        let submission = EditorSubmission {
            selection: None,
            token: Some("t".into()),
        };
        let outcome = EditorGateway::new(AllowAll)
            .save(&store, &"p1".into(), &submission)
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Cleared);
        assert_eq!(store.get(&"p1".into()).unwrap(), None);
    }

    #[test]
    fn test_blank_only_selection_counts_as_empty() {
        let store = store_with("p1", &["5"]);
        let outcome = EditorGateway::new(AllowAll)
            .save(
                &store,
                &"p1".into(),
                &EditorSubmission::new(selection(&["", " "]), "t"),
            )
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Cleared);
    }

    #[test]
    fn test_missing_token_changes_nothing() {
        let store = store_with("p1", &["5"]);
        let submission = EditorSubmission {
            selection: Some(selection(&["9"])),
            token: None,
        };
        let outcome = EditorGateway::new(AllowAll)
            .save(&store, &"p1".into(), &submission)
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Rejected);
        assert!(!outcome.is_applied());
        assert_eq!(
            store.get(&"p1".into()).unwrap(),
            Some([ViewerId::new("5")].into_iter().collect())
        );
    }

    #[test]
    fn test_invalid_token_keeps_absence() {
        let store = AccessListStore::new(MemoryMetaStore::new());
        let outcome = EditorGateway::new(DenyAll)
            .save(&store, &"p1".into(), &EditorSubmission::new(selection(&["9"]), "x"))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Rejected);
        assert_eq!(store.get(&"p1".into()).unwrap(), None);
    }

    #[test]
    fn test_invalid_token_does_not_clear() {
        let store = store_with("p1", &["5"]);
        let outcome = EditorGateway::new(DenyAll)
            .save(&store, &"p1".into(), &EditorSubmission::new(Vec::new(), "x"))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Rejected);
        assert!(store.get(&"p1".into()).unwrap().is_some());
    }

    #[test]
    fn test_keyed_tokens_bound_to_item() {
        let verifier = KeyedTokenVerifier::with_secret("s3cret");
        let token = verifier.issue(&"p1".into());

        assert_eq!(token.len(), 64);
        assert!(verifier.verify(&"p1".into(), &token));
        assert!(!verifier.verify(&"p2".into(), &token));
        assert!(!verifier.verify(&"p1".into(), "not-hex"));
        assert!(!verifier.verify(&"p1".into(), ""));
    }

    #[test]
    fn test_keyed_tokens_bound_to_secret_and_action() {
        let item = ItemId::new("p1");
        let token = KeyedTokenVerifier::with_secret("a").issue(&item);

        assert!(!KeyedTokenVerifier::with_secret("b").verify(&item, &token));
        assert!(!KeyedTokenVerifier::new("a", "other-action").verify(&item, &token));
    }

    #[test]
    fn test_keyed_verifier_debug_redacts_key() {
        let debug = format!("{:?}", KeyedTokenVerifier::with_secret("s3cret"));
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_gateway_with_keyed_tokens() {
        let verifier = KeyedTokenVerifier::with_secret("s3cret");
        let token = verifier.issue(&"p1".into());
        let gateway = EditorGateway::new(verifier);
        let store = AccessListStore::new(MemoryMetaStore::new());

        let ok = gateway
            .save(&store, &"p1".into(), &EditorSubmission::new(selection(&["3"]), token.clone()))
            .unwrap();
        assert_eq!(ok, SaveOutcome::Stored(1));

        let wrong_item = gateway
            .save(&store, &"p2".into(), &EditorSubmission::new(selection(&["3"]), token))
            .unwrap();
        assert_eq!(wrong_item, SaveOutcome::Rejected);
        assert_eq!(store.get(&"p2".into()).unwrap(), None);
    }

    #[test]
    fn test_save_outcome_serializes() {
        let json = serde_json::to_value(SaveOutcome::Stored(3)).unwrap();
        assert_eq!(json["outcome"], "stored");
        assert_eq!(json["viewers"], 3);
    }
}
