//! Identity and allow-list types.
//!
//! Ids are opaque strings compared by exact equality. Numeric-looking ids
//! are never compared numerically or by prefix: `"1"` and `"12"` are simply
//! different tokens.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Ids
// ============================================================================

/// Opaque identifier of a catalog item.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an item id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque identifier of a requesting principal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerId(String);

impl ViewerId {
    /// Create a viewer id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ViewerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Set of viewers an item is restricted to.
pub type ViewerSet = BTreeSet<ViewerId>;

// ============================================================================
// Viewer
// ============================================================================

/// The principal making a request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Viewer {
    /// A guest with no identifier.
    #[default]
    Anonymous,
    /// A signed-in principal.
    Identified(ViewerId),
}

impl Viewer {
    /// Shorthand for an identified viewer.
    pub fn identified(id: impl Into<String>) -> Self {
        Self::Identified(ViewerId::new(id))
    }

    /// Build a viewer from an optional id; `None` is anonymous.
    pub fn from_option(id: Option<impl Into<String>>) -> Self {
        match id {
            Some(id) => Self::identified(id),
            None => Self::Anonymous,
        }
    }

    /// The viewer's id, if any.
    pub fn id(&self) -> Option<&ViewerId> {
        match self {
            Self::Anonymous => None,
            Self::Identified(id) => Some(id),
        }
    }

    /// Whether this viewer is anonymous.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Identified(id) => write!(f, "viewer {id}"),
        }
    }
}

/// Per-request facts every stage receives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Who is asking.
    pub viewer: Viewer,
    /// Whether the request comes from the administrative back office.
    pub admin: bool,
}

impl RequestContext {
    /// A storefront request.
    pub fn storefront(viewer: Viewer) -> Self {
        Self {
            viewer,
            admin: false,
        }
    }

    /// A back-office request.
    pub fn admin(viewer: Viewer) -> Self {
        Self {
            viewer,
            admin: true,
        }
    }
}

// ============================================================================
// AccessList
// ============================================================================

/// Visibility scope of one item.
///
/// `RestrictedTo` with an empty set is a real state: the record exists but
/// names nobody, so the item is hidden from every viewer. It is *not* the
/// same as `Public`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AccessList {
    /// No allow-list record; everyone may see the item.
    #[default]
    Public,
    /// Only the listed viewers may see the item.
    RestrictedTo(ViewerSet),
}

impl AccessList {
    /// Build from the store's optional set.
    pub fn from_record(record: Option<ViewerSet>) -> Self {
        match record {
            Some(set) => Self::RestrictedTo(set),
            None => Self::Public,
        }
    }

    /// Whether the item carries an allow-list record.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::RestrictedTo(_))
    }

    /// The allowed viewers, if restricted.
    pub fn viewers(&self) -> Option<&ViewerSet> {
        match self {
            Self::Public => None,
            Self::RestrictedTo(set) => Some(set),
        }
    }
}

impl fmt::Display for AccessList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::RestrictedTo(set) if set.is_empty() => f.write_str("restricted to nobody"),
            Self::RestrictedTo(set) => {
                let ids: Vec<&str> = set.iter().map(ViewerId::as_str).collect();
                write!(f, "restricted to {}", ids.join(", "))
            }
        }
    }
}
