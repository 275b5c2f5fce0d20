use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{Crdt, Error, Result};

/// A max-change set (MC-Set).
///
/// Every element carries a toggle counter, implicitly 0. An odd counter
/// means present, even means absent; insert and remove only advance the
/// counter when doing so would flip the element's current membership, so
/// repeated inserts (or removes) are no-ops.
///
/// # Example
///
/// ```
/// use lattice_kit::prelude::*;
///
/// let mut s = MCSet::new();
/// s.insert("x");
/// s.insert("x"); // no-op, still present
/// assert!(s.contains(&"x"));
///
/// s.remove(&"x");
/// assert!(!s.contains(&"x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MCSet<T: Ord + Clone> {
    counters: BTreeMap<T, u64>,
}

impl<T: Ord + Clone> MCSet<T> {
    /// Create a new empty MC-Set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: BTreeMap::new(),
        }
    }

    /// Insert an element: advance its counter only if currently even.
    ///
    /// Returns `true` if the element's membership changed.
    pub fn insert(&mut self, value: T) -> bool {
        let counter = self.counters.entry(value).or_insert(0);
        if *counter % 2 == 0 {
            *counter += 1;
            true
        } else {
            false
        }
    }

    /// Remove an element: advance its counter only if currently odd.
    ///
    /// Returns `true` if the element's membership changed.
    pub fn remove(&mut self, value: &T) -> bool {
        match self.counters.get_mut(value) {
            Some(counter) if *counter % 2 == 1 => {
                *counter += 1;
                true
            }
            _ => false,
        }
    }

    /// Check if the set contains an element (odd counter).
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.counters
            .get(value)
            .is_some_and(|counter| counter % 2 == 1)
    }

    /// Get the number of visible elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters
            .values()
            .filter(|counter| *counter % 2 == 1)
            .count()
    }

    /// Check if the set has no visible elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over visible elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.counters
            .iter()
            .filter(|(_, counter)| **counter % 2 == 1)
            .map(|(element, _)| element)
    }
}

impl<T: Ord + Clone + Serialize> MCSet<T> {
    /// Encode as `{"type":"mc-set","e":[[elem,counter],…]}`.
    pub fn to_json(&self) -> Result<Value> {
        let mut elements = Vec::with_capacity(self.counters.len());
        for (element, counter) in &self.counters {
            elements.push(json!([serde_json::to_value(element)?, counter]));
        }
        Ok(json!({ "type": "mc-set", "e": elements }))
    }
}

impl<T: Ord + Clone + DeserializeOwned> MCSet<T> {
    /// Decode from the wire shape produced by [`MCSet::to_json`].
    ///
    /// Every counter must be a positive integer.
    pub fn from_json(value: &Value) -> Result<Self> {
        let entries = value
            .get("e")
            .and_then(Value::as_array)
            .ok_or(Error::InvalidShape("an \"e\" array of counted elements"))?;

        let mut counters = BTreeMap::new();
        for entry in entries {
            let parts = entry
                .as_array()
                .filter(|parts| parts.len() == 2)
                .ok_or_else(|| Error::InvalidElement(entry.to_string()))?;
            let counter = parts[1]
                .as_u64()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::InvalidCounter(parts[1].to_string()))?;
            let element: T = serde_json::from_value(parts[0].clone())?;
            counters.insert(element, counter);
        }
        Ok(MCSet { counters })
    }
}

impl<T: Ord + Clone> Default for MCSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Crdt for MCSet<T> {
    /// Per element, the maximum counter across both operands; summing
    /// would inflate under repeated merges and break idempotence.
    fn merge(&self, other: &Self) -> Result<Self> {
        let mut merged = self.clone();
        for (element, &counter) in &other.counters {
            merged
                .counters
                .entry(element.clone())
                .and_modify(|c| *c = (*c).max(counter))
                .or_insert(counter);
        }
        Ok(merged)
    }
}
