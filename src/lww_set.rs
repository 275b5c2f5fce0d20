use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{Crdt, Error, Result};

/// Tie-breaking rule applied when an element's add and remove timestamps
/// are equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Bias {
    /// Ties keep the element (`"a"` on the wire).
    #[default]
    Add,
    /// Ties drop the element (`"r"` on the wire).
    Remove,
}

impl Bias {
    /// The wire discriminator for this bias.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::Add => "a",
            Bias::Remove => "r",
        }
    }

    fn from_wire(value: Option<&Value>) -> Result<Self> {
        match value {
            None => Ok(Bias::Add),
            Some(v) => match v.as_str() {
                Some("a") => Ok(Bias::Add),
                Some("r") => Ok(Bias::Remove),
                _ => Err(Error::InvalidShape("a \"bias\" of \"a\" or \"r\"")),
            },
        }
    }
}

/// A last-write-wins element set (LWW-E-Set).
///
/// Every add and remove is stamped with a timestamp (epoch milliseconds).
/// An element is present iff it has an add timestamp that is not strictly
/// earlier than its remove timestamp; equal timestamps are resolved by the
/// set's [`Bias`].
///
/// # Example
///
/// ```
/// use lattice_kit::prelude::*;
///
/// let mut s1 = LWWESet::new();
/// s1.insert_at("x", 1);
///
/// let mut s2 = LWWESet::new();
/// s2.insert_at("x", 0);
/// s2.remove_at(&"x", 0);
///
/// // The t=1 add dominates the t=0 remove, in either merge order.
/// assert!(s1.merge(&s2).unwrap().contains(&"x"));
/// assert!(s2.merge(&s1).unwrap().contains(&"x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LWWESet<T: Ord + Clone> {
    bias: Bias,
    adds: BTreeMap<T, u64>,
    removes: BTreeMap<T, u64>,
}

impl<T: Ord + Clone> LWWESet<T> {
    /// Create an empty set with [`Bias::Add`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_bias(Bias::default())
    }

    /// Create an empty set with an explicit bias.
    #[must_use]
    pub fn with_bias(bias: Bias) -> Self {
        Self {
            bias,
            adds: BTreeMap::new(),
            removes: BTreeMap::new(),
        }
    }

    /// Create a set whose initial elements are all stamped with the given
    /// "zero" timestamp.
    pub fn seeded(bias: Bias, zero: u64, elements: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::with_bias(bias);
        for element in elements {
            set.adds.insert(element, zero);
        }
        set
    }

    /// This set's tie-breaking bias.
    #[must_use]
    pub fn bias(&self) -> Bias {
        self.bias
    }

    /// Insert an element, stamped with the current wall clock.
    ///
    /// Returns `true` if the element had no add timestamp before.
    pub fn insert(&mut self, value: T) -> bool {
        self.insert_at(value, now_millis())
    }

    /// Insert an element with an explicit timestamp.
    ///
    /// The timestamp overwrites any previously recorded add timestamp;
    /// callers are expected to supply advancing clocks.
    pub fn insert_at(&mut self, value: T, timestamp: u64) -> bool {
        self.adds.insert(value, timestamp).is_none()
    }

    /// Remove an element, stamped with the current wall clock.
    pub fn remove(&mut self, value: &T) -> bool {
        self.remove_at(value, now_millis())
    }

    /// Remove an element with an explicit timestamp.
    ///
    /// Recorded only when the element has an add timestamp; removing a
    /// never-added element is a no-op. Returns `true` if a remove
    /// timestamp was recorded.
    pub fn remove_at(&mut self, value: &T, timestamp: u64) -> bool {
        if self.adds.contains_key(value) {
            self.removes.insert(value.clone(), timestamp);
            true
        } else {
            false
        }
    }

    /// Check if the set contains an element under the bias rule.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        let Some(added) = self.adds.get(value) else {
            return false;
        };
        match self.removes.get(value) {
            None => true,
            Some(removed) => match self.bias {
                Bias::Add => added >= removed,
                Bias::Remove => added > removed,
            },
        }
    }

    /// Get the number of visible elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Check if the set has no visible elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over visible elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.adds.keys().filter(|k| self.contains(k))
    }
}

impl<T: Ord + Clone + Serialize> LWWESet<T> {
    /// Encode as `{"type":"lww-e-set","bias":…,"e":[[elem,add]|[elem,add,remove],…]}`.
    pub fn to_json(&self) -> Result<Value> {
        let mut elements = Vec::with_capacity(self.adds.len());
        for (element, &added) in &self.adds {
            let encoded = serde_json::to_value(element)?;
            let entry = match self.removes.get(element) {
                Some(&removed) => json!([encoded, added, removed]),
                None => json!([encoded, added]),
            };
            elements.push(entry);
        }
        Ok(json!({ "type": "lww-e-set", "bias": self.bias.as_str(), "e": elements }))
    }
}

impl<T: Ord + Clone + DeserializeOwned> LWWESet<T> {
    /// Decode from the wire shape produced by [`LWWESet::to_json`].
    ///
    /// Entries are `[elem]` (added at t=0), `[elem, add]`, or
    /// `[elem, add, remove]`; anything else is a validation error.
    pub fn from_json(value: &Value) -> Result<Self> {
        let bias = Bias::from_wire(value.get("bias"))?;
        let entries = value
            .get("e")
            .and_then(Value::as_array)
            .ok_or(Error::InvalidShape("an \"e\" array of timestamped elements"))?;

        let mut set = Self::with_bias(bias);
        for entry in entries {
            let invalid = || Error::InvalidElement(entry.to_string());
            let parts = entry.as_array().ok_or_else(invalid)?;
            let element: T = match parts.first() {
                Some(v) => serde_json::from_value(v.clone())?,
                None => return Err(invalid()),
            };
            match parts.len() {
                1 => {
                    set.adds.insert(element, 0);
                }
                2 | 3 => {
                    let added = parts[1].as_u64().ok_or_else(invalid)?;
                    if let Some(removed) = parts.get(2) {
                        let removed = removed.as_u64().ok_or_else(invalid)?;
                        set.removes.insert(element.clone(), removed);
                    }
                    set.adds.insert(element, added);
                }
                _ => return Err(invalid()),
            }
        }
        Ok(set)
    }
}

impl<T: Ord + Clone> Default for LWWESet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Crdt for LWWESet<T> {
    /// Per element, the maximum add timestamp and the maximum remove
    /// timestamp across both operands, kept independently.
    fn merge(&self, other: &Self) -> Result<Self> {
        if self.bias != other.bias {
            return Err(Error::BiasMismatch);
        }
        let mut merged = self.clone();
        for (element, &timestamp) in &other.adds {
            merged
                .adds
                .entry(element.clone())
                .and_modify(|t| *t = (*t).max(timestamp))
                .or_insert(timestamp);
        }
        for (element, &timestamp) in &other.removes {
            merged
                .removes
                .entry(element.clone())
                .and_modify(|t| *t = (*t).max(timestamp))
                .or_insert(timestamp);
        }
        Ok(merged)
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
