use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::tag::{Tag, TagMinter};
use crate::{Crdt, Error, Result};

/// An observed-remove set (OR-Set), also known as an add-wins set.
///
/// Elements can be freely added, removed, and re-added. Every add is
/// identified by a unique [`Tag`] from the set's [`TagMinter`]; a remove
/// tombstones only the tags the remover has observed, so a concurrent add
/// on another replica survives the merge.
///
/// Replicas that intend to merge must share one minter (see
/// [`ORSet::with_minter`]); tags minted by different registries are not
/// comparable and merging such sets fails.
///
/// # Example
///
/// ```
/// use lattice_kit::prelude::*;
/// use lattice_kit::TagMinter;
///
/// let minter = TagMinter::new();
/// let mut s1 = ORSet::with_minter(&minter);
/// s1.insert("apple");
/// s1.insert("banana");
/// s1.remove(&"banana");
///
/// let mut s2 = ORSet::with_minter(&minter);
/// s2.insert("banana"); // concurrent add, unobserved by s1's remove
///
/// let merged = s1.merge(&s2).unwrap();
/// assert!(merged.contains(&"banana"));
/// assert!(merged.contains(&"apple"));
/// ```
#[derive(Debug, Clone)]
pub struct ORSet<T: Ord + Clone> {
    minter: TagMinter,
    adds: BTreeMap<T, BTreeSet<Tag>>,
    removes: BTreeMap<T, BTreeSet<Tag>>,
}

impl<T: Ord + Clone> ORSet<T> {
    /// Create an empty set owning a fresh tag registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_minter(&TagMinter::new())
    }

    /// Create an empty set sharing the given tag registry.
    #[must_use]
    pub fn with_minter(minter: &TagMinter) -> Self {
        Self {
            minter: minter.clone(),
            adds: BTreeMap::new(),
            removes: BTreeMap::new(),
        }
    }

    /// The tag registry this set mints from.
    #[must_use]
    pub fn minter(&self) -> &TagMinter {
        &self.minter
    }

    /// Insert an element under one fresh anonymous tag.
    ///
    /// Returns `true` if the element's membership changed.
    pub fn insert(&mut self, value: T) -> bool {
        let was_present = self.contains(&value);
        let tag = self.minter.mint_fresh();
        self.adds.entry(value).or_default().insert(tag);
        !was_present
    }

    /// Insert an element under one stable tag per label.
    ///
    /// A no-op when every labeled tag is already recorded for the element.
    /// With no labels this behaves like [`ORSet::insert`]. Returns `true`
    /// if the element's membership changed.
    pub fn insert_labeled(&mut self, value: T, labels: &[&str]) -> bool {
        if labels.is_empty() {
            return self.insert(value);
        }
        let was_present = self.contains(&value);
        let tags: Vec<Tag> = labels.iter().map(|label| self.minter.mint(label)).collect();
        let added = self.adds.entry(value).or_default();
        if tags.iter().all(|tag| added.contains(tag)) {
            return false;
        }
        added.extend(tags);
        !was_present
    }

    /// Remove an element by tombstoning every add tag observed so far.
    ///
    /// Concurrent adds this replica has not observed survive a later merge.
    /// Returns `true` if the element's membership changed.
    pub fn remove(&mut self, value: &T) -> bool {
        let observed: Vec<Tag> = match self.adds.get(value) {
            Some(tags) if !tags.is_empty() => tags.iter().copied().collect(),
            _ => return false,
        };
        let was_present = self.contains(value);
        self.removes
            .entry(value.clone())
            .or_default()
            .extend(observed);
        was_present
    }

    /// Remove exactly the tags named by the labels.
    ///
    /// A no-op when every labeled tag is already tombstoned. With no labels
    /// this behaves like [`ORSet::remove`]. Returns `true` if the element's
    /// membership changed.
    pub fn remove_labeled(&mut self, value: &T, labels: &[&str]) -> bool {
        if labels.is_empty() {
            return self.remove(value);
        }
        let was_present = self.contains(value);
        let tags: Vec<Tag> = labels.iter().map(|label| self.minter.mint(label)).collect();
        let removed = self.removes.entry(value.clone()).or_default();
        if tags.iter().all(|tag| removed.contains(tag)) {
            return false;
        }
        removed.extend(tags);
        was_present && !self.contains(value)
    }

    /// Check if the set contains an element: some add tag must not be
    /// covered by the element's tombstones.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        let Some(added) = self.adds.get(value) else {
            return false;
        };
        match self.removes.get(value) {
            None => !added.is_empty(),
            Some(removed) => added.iter().any(|tag| !removed.contains(tag)),
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
        self.adds.keys().filter(|element| self.contains(element))
    }
}

impl<T: Ord + Clone + Serialize> ORSet<T> {
    /// Encode as `{"type":"or-set","e":[[elem,addLabels]|[elem,addLabels,removeLabels],…]}`.
    ///
    /// Tags serialize as their labels; anonymous tags use their counter
    /// value in decimal.
    pub fn to_json(&self) -> Result<Value> {
        let mut elements = Vec::with_capacity(self.adds.len());
        for (element, added) in &self.adds {
            let encoded = serde_json::to_value(element)?;
            let add_labels = self.labels_of(added);
            let entry = match self.removes.get(element) {
                Some(removed) => json!([encoded, add_labels, self.labels_of(removed)]),
                None => json!([encoded, add_labels]),
            };
            elements.push(entry);
        }
        Ok(json!({ "type": "or-set", "e": elements }))
    }

    fn labels_of(&self, tags: &BTreeSet<Tag>) -> Vec<String> {
        tags.iter().map(|&tag| self.minter.label_of(tag)).collect()
    }
}

impl<T: Ord + Clone + DeserializeOwned> ORSet<T> {
    /// Decode into a set owning a fresh tag registry.
    ///
    /// The result can only merge with sets sharing that registry; to
    /// reconstruct several replicas that should be mergeable, thread one
    /// registry through [`ORSet::from_json_with_minter`].
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::from_json_with_minter(value, &TagMinter::new())
    }

    /// Decode, re-minting every tag label through the given registry.
    pub fn from_json_with_minter(value: &Value, minter: &TagMinter) -> Result<Self> {
        let entries = value
            .get("e")
            .and_then(Value::as_array)
            .ok_or(Error::InvalidShape("an \"e\" array of tagged elements"))?;

        let mut set = Self::with_minter(minter);
        let zero = minter.mint_fresh();
        for entry in entries {
            let invalid = || Error::InvalidElement(entry.to_string());
            let parts = entry.as_array().ok_or_else(invalid)?;
            let element: T = match parts.first() {
                Some(v) => serde_json::from_value(v.clone())?,
                None => return Err(invalid()),
            };
            match parts.len() {
                1 => {
                    set.adds.entry(element).or_default().insert(zero);
                }
                2 | 3 => {
                    let added = decode_tags(&parts[1], minter).ok_or_else(invalid)?;
                    if let Some(labels) = parts.get(2) {
                        let removed = decode_tags(labels, minter).ok_or_else(invalid)?;
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

fn decode_tags(value: &Value, minter: &TagMinter) -> Option<BTreeSet<Tag>> {
    let labels = value.as_array()?;
    labels
        .iter()
        .map(|label| label.as_str().map(|l| minter.mint(l)))
        .collect()
}

impl<T: Ord + Clone> Default for ORSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Crdt for ORSet<T> {
    /// Per element, the union of add tags and the union of tombstones.
    /// Operands must share one tag registry.
    fn merge(&self, other: &Self) -> Result<Self> {
        if !self.minter.same_registry(&other.minter) {
            return Err(Error::MinterMismatch);
        }
        let mut merged = self.clone();
        for (element, tags) in &other.adds {
            merged
                .adds
                .entry(element.clone())
                .or_default()
                .extend(tags.iter().copied());
        }
        for (element, tags) in &other.removes {
            merged
                .removes
                .entry(element.clone())
                .or_default()
                .extend(tags.iter().copied());
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_set_is_empty() {
        let s = ORSet::<String>::new();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn insert_and_contains() {
        let mut s = ORSet::new();
        assert!(s.insert("x"));
        assert!(s.contains(&"x"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn remove_tombstones_observed_tags() {
        let mut s = ORSet::new();
        s.insert("x");
        assert!(s.remove(&"x"));
        assert!(!s.contains(&"x"));
        assert!(!s.remove(&"x"));
    }

    #[test]
    fn can_readd_after_remove() {
        let mut s = ORSet::new();
        s.insert("x");
        s.remove(&"x");
        assert!(!s.contains(&"x"));
        assert!(s.insert("x"));
        assert!(s.contains(&"x"));
    }

    #[test]
    fn labeled_insert_is_stable() {
        let mut s = ORSet::new();
        assert!(s.insert_labeled("x", &["a"]));
        assert!(!s.insert_labeled("x", &["a"])); // same tag, no-op
        s.remove_labeled(&"x", &["a"]);
        assert!(!s.contains(&"x"));
    }

    #[test]
    fn labeled_remove_leaves_other_tags() {
        let mut s = ORSet::new();
        s.insert_labeled("x", &["a", "b"]);
        assert!(!s.remove_labeled(&"x", &["a"])); // "b" still uncovered
        assert!(s.contains(&"x"));
        assert!(s.remove_labeled(&"x", &["b"]));
        assert!(!s.contains(&"x"));
    }

    #[test]
    fn concurrent_add_survives_remove() {
        let minter = TagMinter::new();
        let mut s1 = ORSet::with_minter(&minter);
        s1.insert("x");
        s1.remove(&"x");

        let mut s2 = ORSet::with_minter(&minter);
        s2.insert("x"); // tag s1 never observed

        let merged = s1.merge(&s2).unwrap();
        assert!(merged.contains(&"x"));
        assert!(s2.merge(&s1).unwrap().contains(&"x"));
    }

    #[test]
    fn remove_only_covers_observed_tags() {
        let minter = TagMinter::new();
        let mut shared = ORSet::with_minter(&minter);
        shared.insert("item");

        let mut alice = shared.clone();
        let mut bob = shared.clone();

        bob.insert("item"); // fresh tag alice never sees
        alice.remove(&"item");

        let merged = alice.merge(&bob).unwrap();
        assert!(merged.contains(&"item"));
    }

    #[test]
    fn merge_is_idempotent() {
        let minter = TagMinter::new();
        let mut s1 = ORSet::with_minter(&minter);
        s1.insert(1);
        let mut s2 = ORSet::with_minter(&minter);
        s2.insert(2);

        let once = s1.merge(&s2).unwrap();
        let twice = once.merge(&s2).unwrap();
        let elems: Vec<&i32> = once.iter().collect();
        let elems_twice: Vec<&i32> = twice.iter().collect();
        assert_eq!(elems, elems_twice);
    }

    #[test]
    fn merge_rejects_foreign_registries() {
        let s1 = ORSet::<i32>::new();
        let s2 = ORSet::<i32>::new();
        assert!(matches!(s1.merge(&s2), Err(Error::MinterMismatch)));
    }

    #[test]
    fn iterate_visible_elements() {
        let mut s = ORSet::new();
        s.insert(1);
        s.insert(2);
        s.insert(3);
        s.remove(&2);
        let visible: Vec<&i32> = s.iter().collect();
        assert_eq!(visible, vec![&1, &3]);
    }

    #[test]
    fn wire_round_trip_preserves_membership() {
        let mut s = ORSet::new();
        s.insert_labeled("kept", &["a", "b"]);
        s.insert_labeled("gone", &["c"]);
        s.remove(&"gone");
        let decoded: ORSet<String> = ORSet::from_json(&s.to_json().unwrap()).unwrap();
        assert!(decoded.contains(&"kept".to_string()));
        assert!(!decoded.contains(&"gone".to_string()));
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn parsed_replicas_merge_through_a_shared_registry() {
        let mut s = ORSet::new();
        s.insert_labeled("x", &["a"]);
        let json = s.to_json().unwrap();

        let shared = TagMinter::new();
        let one: ORSet<String> = ORSet::from_json_with_minter(&json, &shared).unwrap();
        let mut two: ORSet<String> = ORSet::from_json_with_minter(&json, &shared).unwrap();
        two.remove(&"x".to_string());

        let merged = one.merge(&two).unwrap();
        assert!(!merged.contains(&"x".to_string()));
    }

    #[test]
    fn decode_handles_all_entry_arities() {
        let set: ORSet<i64> = ORSet::from_json(&json!({
            "type": "or-set",
            "e": [[0], [1, ["a"]], [2, ["a"], ["a"]], [3, ["a", "b"], ["b", "c"]]],
        }))
        .unwrap();
        let visible: Vec<&i64> = set.iter().collect();
        assert_eq!(visible, vec![&0, &1, &3]);
    }

    #[test]
    fn decode_rejects_malformed_entries() {
        for e in [json!(null), json!([[]]), json!([null]), json!([[1, "tags"]])] {
            let err = ORSet::<i64>::from_json(&json!({"type": "or-set", "e": e})).unwrap_err();
            assert!(!err.is_type_error());
        }
    }
}
