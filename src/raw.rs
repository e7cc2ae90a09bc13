//! Raw, unvalidated values
//!
//! Decoded from MessagePack by the transport and the persistence store.
//! Nothing here is trusted until it went through [`crate::validate`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Scratch bytes one decoded node occupies, strings excluded
pub const NODE_SIZE: usize = 16;

/// Raw parameter set of one effect: field name to value
pub type RawParams = BTreeMap<String, RawValue>;

/// Self-describing value tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, RawValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Entry of a map value
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.as_map()?.get(key)
    }

    /// Bytes of decode scratch this tree needs
    ///
    /// Every node costs [`NODE_SIZE`], strings and keys add their length
    /// plus a terminator.
    pub fn footprint(&self) -> usize {
        NODE_SIZE
            + match self {
                Self::Null | Self::Bool(_) | Self::Number(_) => 0,
                Self::Text(text) => text.len() + 1,
                Self::List(items) => items.iter().map(Self::footprint).sum(),
                Self::Map(entries) => entries
                    .iter()
                    .map(|(key, value)| key.len() + 1 + value.footprint())
                    .sum(),
            }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<RawParams> for RawValue {
    fn from(value: RawParams) -> Self {
        Self::Map(value)
    }
}
