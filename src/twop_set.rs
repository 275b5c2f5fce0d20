use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::gset::{decode_elements, encode_elements};
use crate::{Crdt, Result};

/// A two-phase set (2P-Set).
///
/// Elements can be added and removed, but once removed, they cannot be
/// re-added. This is implemented with two grow-only sets: one for additions
/// and one for removals (tombstones).
///
/// # Example
///
/// ```
/// use lattice_kit::prelude::*;
///
/// let mut s1 = TwoPSet::new();
/// s1.insert("apple");
/// s1.insert("banana");
/// s1.remove(&"banana");
///
/// assert!(s1.contains(&"apple"));
/// assert!(!s1.contains(&"banana")); // removed
///
/// let mut s2 = TwoPSet::new();
/// s2.insert("banana"); // trying to re-add on another replica
///
/// let merged = s1.merge(&s2).unwrap();
/// assert!(!merged.contains(&"banana")); // still removed (tombstone wins)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoPSet<T: Ord + Clone> {
    added: BTreeSet<T>,
    removed: BTreeSet<T>,
}

impl<T: Ord + Clone> TwoPSet<T> {
    /// Create a new empty 2P-Set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    /// Insert an element.
    ///
    /// Returns `true` if the element was newly added. A tombstoned element
    /// can never return; inserting it again is a no-op returning `false`.
    pub fn insert(&mut self, value: T) -> bool {
        if self.removed.contains(&value) {
            return false;
        }
        self.added.insert(value)
    }

    /// Remove an element.
    ///
    /// Only an element that is currently visible (added and not yet
    /// removed) can be tombstoned; anything else is a no-op. Returns `true`
    /// if the element was present and is now removed.
    pub fn remove(&mut self, value: &T) -> bool {
        if self.added.contains(value) && !self.removed.contains(value) {
            self.removed.insert(value.clone());
            true
        } else {
            false
        }
    }

    /// Check if the set contains an element (added and not removed).
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.added.contains(value) && !self.removed.contains(value)
    }

    /// Get the number of visible elements (added minus removed).
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.difference(&self.removed).count()
    }

    /// Check if the set has no visible elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over visible elements (added and not removed).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.added.difference(&self.removed)
    }
}

impl<T: Ord + Clone + Serialize> TwoPSet<T> {
    /// Encode as `{"type":"2p-set","a":[…],"r":[…]}`.
    pub fn to_json(&self) -> Result<Value> {
        Ok(json!({
            "type": "2p-set",
            "a": encode_elements(self.added.iter())?,
            "r": encode_elements(self.removed.iter())?,
        }))
    }
}

impl<T: Ord + Clone + DeserializeOwned> TwoPSet<T> {
    /// Decode from the wire shape produced by [`TwoPSet::to_json`].
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(TwoPSet {
            added: decode_elements(value.get("a"), "an \"a\" array of elements")?,
            removed: decode_elements(value.get("r"), "an \"r\" array of elements")?,
        })
    }
}

impl<T: Ord + Clone> Default for TwoPSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Crdt for TwoPSet<T> {
    /// Union of the added sets and union of the removed sets, computed
    /// independently; each side is itself a grow-only set.
    fn merge(&self, other: &Self) -> Result<Self> {
        let mut merged = self.clone();
        for elem in &other.added {
            merged.added.insert(elem.clone());
        }
        for elem in &other.removed {
            merged.removed.insert(elem.clone());
        }
        Ok(merged)
    }
}
