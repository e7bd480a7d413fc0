//! Related-items pruning.
//!
//! Recommendation candidates come from an external recommender. This filter
//! removes every candidate that carries an allow-list record, without
//! asking whether the current viewer is on that list. It is deliberately
//! coarser than the listing filter: a viewer who may see a restricted item
//! in the catalog still never gets it recommended.

use privet_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::meta::MetaStore;
use crate::store::AccessListStore;
use crate::types::ItemId;

/// How the related-items stage is wired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelatedMode {
    /// Strip every candidate that has an allow-list record.
    #[default]
    StripRestricted,
    /// Leave the stage unregistered; candidates pass through untouched.
    Disconnected,
}

impl std::str::FromStr for RelatedMode {
    type Err = privet_core::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strip-restricted" => Ok(Self::StripRestricted),
            "disconnected" => Ok(Self::Disconnected),
            other => Err(privet_core::Error::config(format!(
                "Unknown related mode '{other}' (expected strip-restricted or disconnected)"
            ))),
        }
    }
}

/// A related-items request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRequest {
    /// The item recommendations are computed for.
    pub source: ItemId,
    /// Candidate ids in recommender order.
    pub candidates: Vec<ItemId>,
    /// Extra arguments the recommender was called with.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, String>,
}

impl RelatedRequest {
    /// Create a request.
    pub fn new(source: impl Into<ItemId>, candidates: Vec<ItemId>) -> Self {
        Self {
            source: source.into(),
            candidates,
            args: BTreeMap::new(),
        }
    }

    /// Add a recommender argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// Removes restricted items from recommendation candidates.
#[derive(Clone, Copy, Debug, Default)]
pub struct RelatedItemsFilter;

impl RelatedItemsFilter {
    /// Create the filter.
    pub fn new() -> Self {
        Self
    }

    /// Return the candidates that carry no allow-list record, in order.
    pub fn apply<M: MetaStore>(
        &self,
        store: &AccessListStore<M>,
        request: RelatedRequest,
    ) -> Result<Vec<ItemId>> {
        let restricted = store.restricted_items()?;
        let before = request.candidates.len();
        let mut candidates = request.candidates;
        candidates.retain(|id| !restricted.contains(id));

        log::debug!(
            "Related items for {}: kept {} of {} candidate(s)",
            request.source,
            candidates.len(),
            before
        );
        Ok(candidates)
    }
}
