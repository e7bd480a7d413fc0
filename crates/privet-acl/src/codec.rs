//! Stored value format for allow-lists.
//!
//! An allow-list is stored as a JSON array of string tokens, e.g.
//! `["12","5"]`. Tokens are always strings so that membership is decided on
//! whole tokens. Encoding is deterministic: the set is written in its
//! sorted order.
//!
//! Older writers sometimes produced a JSON object of index to token
//! (`{"0":"5","2":"12"}`) when the submitted array had gaps. Those values
//! decode to the same set.

use privet_core::{Error, Result};
use serde_json::Value;

use crate::types::{ViewerId, ViewerSet};

/// Encode a viewer set as a JSON array of strings.
pub fn encode(viewers: &ViewerSet) -> Result<String> {
    Ok(serde_json::to_string(viewers)?)
}

/// Decode a stored value, failing on anything that is not a list of strings.
pub fn try_decode(raw: &str) -> Result<ViewerSet> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| Error::parse(format!("allow-list is not JSON: {e}")))?;

    let tokens: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => {
            return Err(Error::invalid_data(format!(
                "allow-list must be an array, found {}",
                kind_of(&other)
            )));
        }
    };

    tokens
        .into_iter()
        .map(|token| match token {
            Value::String(s) => Ok(ViewerId::new(s)),
            other => Err(Error::invalid_data(format!(
                "allow-list token must be a string, found {}",
                kind_of(&other)
            ))),
        })
        .collect()
}

/// Decode a stored value, recovering from malformed data as an empty set.
///
/// The empty set keeps the item restricted (to nobody) rather than opening
/// it up, so a corrupt record never widens visibility.
pub fn decode(raw: &str) -> ViewerSet {
    match try_decode(raw) {
        Ok(set) => set,
        Err(e) => {
            log::warn!("Unreadable allow-list value {raw:?}, treating as empty: {e}");
            ViewerSet::new()
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
