use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{Crdt, Error, Result};

/// A grow-only set (G-Set).
///
/// Elements can be added but never removed. Merge is simply the union
/// of both sets. This is the simplest set CRDT.
///
/// # Example
///
/// ```
/// use lattice_kit::prelude::*;
///
/// let mut s1 = GSet::new();
/// s1.insert("apple");
/// s1.insert("banana");
///
/// let mut s2 = GSet::new();
/// s2.insert("cherry");
///
/// let merged = s1.merge(&s2).unwrap();
/// assert_eq!(merged.len(), 3);
/// assert!(merged.contains(&"cherry"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GSet<T: Ord + Clone> {
    elements: BTreeSet<T>,
}

impl<T: Ord + Clone> GSet<T> {
    /// Create a new empty G-Set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: BTreeSet::new(),
        }
    }

    /// Insert an element into the set.
    ///
    /// Returns `true` if the element was newly inserted.
    pub fn insert(&mut self, value: T) -> bool {
        self.elements.insert(value)
    }

    /// Check if the set contains an element.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.elements.contains(value)
    }

    /// Get the number of elements in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the elements in the set.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }
}

impl<T: Ord + Clone + Serialize> GSet<T> {
    /// Encode as `{"type":"g-set","e":[element,…]}`.
    pub fn to_json(&self) -> Result<Value> {
        let elements = encode_elements(self.elements.iter())?;
        Ok(json!({ "type": "g-set", "e": elements }))
    }
}

impl<T: Ord + Clone + DeserializeOwned> GSet<T> {
    /// Decode from the wire shape produced by [`GSet::to_json`].
    pub fn from_json(value: &Value) -> Result<Self> {
        let elements = decode_elements(value.get("e"), "an \"e\" array of elements")?;
        Ok(GSet { elements })
    }
}

impl<T: Ord + Clone> Default for GSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Crdt for GSet<T> {
    fn merge(&self, other: &Self) -> Result<Self> {
        let mut elements = self.elements.clone();
        for elem in &other.elements {
            elements.insert(elem.clone());
        }
        Ok(GSet { elements })
    }
}

impl<T: Ord + Clone> IntoIterator for GSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<T: Ord + Clone> FromIterator<T> for GSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: BTreeSet::from_iter(iter),
        }
    }
}

pub(crate) fn encode_elements<'a, T: Serialize + 'a>(
    elements: impl Iterator<Item = &'a T>,
) -> Result<Vec<Value>> {
    elements
        .map(|e| serde_json::to_value(e).map_err(Error::from))
        .collect()
}

pub(crate) fn decode_elements<T: Ord + DeserializeOwned>(
    value: Option<&Value>,
    shape: &'static str,
) -> Result<BTreeSet<T>> {
    let array = value
        .and_then(Value::as_array)
        .ok_or(Error::InvalidShape(shape))?;
    array
        .iter()
        .map(|v| serde_json::from_value(v.clone()).map_err(Error::from))
        .collect()
}
