use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::{Crdt, Error, Result};

/// Actor slot charged when an update names no actor.
pub const NULL_ACTOR: &str = "null";

/// A grow-only counter (G-Counter).
///
/// Each actor accumulates into its own slot. The total value is the sum of
/// all slots. This counter can only grow, never shrink.
///
/// # Example
///
/// ```
/// use lattice_kit::prelude::*;
///
/// let mut c1 = GCounter::new();
/// c1.update_for("node-1", 2.0).unwrap();
///
/// let mut c2 = GCounter::new();
/// c2.update_for("node-2", 1.0).unwrap();
///
/// let merged = c1.merge(&c2).unwrap();
/// assert_eq!(merged.value(), 3.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GCounter {
    slots: BTreeMap<String, f64>,
}

impl GCounter {
    /// Create an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add 1 to the [`NULL_ACTOR`] slot.
    pub fn increment(&mut self) -> Result<()> {
        self.update(1.0)
    }

    /// Add `amount` to the [`NULL_ACTOR`] slot.
    ///
    /// The amount must be finite and positive.
    pub fn update(&mut self, amount: f64) -> Result<()> {
        self.update_for(NULL_ACTOR, amount)
    }

    /// Add `amount` to the named actor's slot.
    ///
    /// The amount must be finite and positive.
    pub fn update_for(&mut self, actor: &str, amount: f64) -> Result<()> {
        if !safe_amount(amount) {
            return Err(Error::UnsafeAmount);
        }
        *self.slots.entry(actor.to_string()).or_insert(0.0) += amount;
        Ok(())
    }

    /// Get the total counter value across all actors.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.slots.values().sum()
    }

    /// Get the amount accumulated by a specific actor.
    #[must_use]
    pub fn count_for(&self, actor: &str) -> f64 {
        self.slots.get(actor).copied().unwrap_or(0.0)
    }

    /// Iterate over the actors with a slot.
    pub fn actors(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Encode as `{"type":"g-counter","e":{actor:amount,…}}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({ "type": "g-counter", "e": encode_slots(&self.slots) })
    }

    /// Decode from the wire shape produced by [`GCounter::to_json`].
    ///
    /// Every slot value must be a finite, non-negative number.
    pub fn from_json(value: &Value) -> Result<Self> {
        let slots = decode_slots(value.get("e"), "an \"e\" object of numbers")?;
        Ok(GCounter { slots })
    }

    pub(crate) fn from_slots(slots: BTreeMap<String, f64>) -> Self {
        GCounter { slots }
    }

    pub(crate) fn slots(&self) -> &BTreeMap<String, f64> {
        &self.slots
    }
}

impl Crdt for GCounter {
    fn merge(&self, other: &Self) -> Result<Self> {
        let mut slots = self.slots.clone();
        for (actor, &amount) in &other.slots {
            let slot = slots.entry(actor.clone()).or_insert(0.0);
            *slot = slot.max(amount);
        }
        Ok(GCounter { slots })
    }
}

/// An actor's own slot only ever grows, so an update amount must be finite
/// and at least one epsilon above zero.
fn safe_amount(amount: f64) -> bool {
    amount.is_finite() && amount >= f64::EPSILON
}

pub(crate) fn encode_slots(slots: &BTreeMap<String, f64>) -> Value {
    let mut map = Map::new();
    for (actor, &amount) in slots {
        map.insert(actor.clone(), json!(amount));
    }
    Value::Object(map)
}

pub(crate) fn decode_slots(
    value: Option<&Value>,
    shape: &'static str,
) -> Result<BTreeMap<String, f64>> {
    let object = value
        .and_then(Value::as_object)
        .ok_or(Error::InvalidShape(shape))?;
    let mut slots = BTreeMap::new();
    for (key, v) in object {
        let amount = v
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .ok_or_else(|| Error::UnsafeValue { key: key.clone() })?;
        slots.insert(key.clone(), amount);
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_counter_is_zero() {
        let c = GCounter::new();
        assert_eq!(c.value(), 0.0);
    }

    #[test]
    fn update_accumulates_per_actor() {
        let mut c = GCounter::new();
        c.update_for("a", 1.0).unwrap();
        c.update_for("b", 2.0).unwrap();
        assert_eq!(c.value(), 3.0);
        assert_eq!(c.count_for("a"), 1.0);
        assert_eq!(c.count_for("c"), 0.0);
    }

    #[test]
    fn update_defaults_to_the_null_actor() {
        let mut c = GCounter::new();
        c.update(2.5).unwrap();
        assert_eq!(c.count_for(NULL_ACTOR), 2.5);
    }

    #[test]
    fn increment_adds_one() {
        let mut c = GCounter::new();
        c.increment().unwrap();
        c.increment().unwrap();
        assert_eq!(c.value(), 2.0);
    }

    #[test]
    fn rejects_unsafe_amounts() {
        let mut c = GCounter::new();
        assert!(matches!(c.update(-1.0), Err(Error::UnsafeAmount)));
        assert!(matches!(c.update(0.0), Err(Error::UnsafeAmount)));
        assert!(matches!(c.update(f64::NAN), Err(Error::UnsafeAmount)));
        assert!(matches!(c.update(f64::INFINITY), Err(Error::UnsafeAmount)));
        assert_eq!(c.value(), 0.0);
    }

    #[test]
    fn merge_takes_max_per_actor() {
        let mut c1 = GCounter::new();
        c1.update_for("a", 2.0).unwrap();

        let mut c2 = GCounter::new();
        c2.update_for("a", 1.0).unwrap();
        c2.update_for("b", 3.0).unwrap();

        let merged = c1.merge(&c2).unwrap();
        assert_eq!(merged.value(), 5.0);
    }

    #[test]
    fn merge_with_self_does_not_inflate() {
        let mut c = GCounter::new();
        c.update_for("a", 4.0).unwrap();
        assert_eq!(c.merge(&c).unwrap().value(), 4.0);
    }

    #[test]
    fn merge_leaves_operands_untouched() {
        let mut c1 = GCounter::new();
        c1.update_for("a", 1.0).unwrap();
        let c2 = GCounter::new();
        let snapshot = c1.clone();
        let _ = c1.merge(&c2).unwrap();
        assert_eq!(c1, snapshot);
    }

    #[test]
    fn wire_round_trip() {
        let mut c = GCounter::new();
        c.update_for("a", 1.5).unwrap();
        c.update(2.0).unwrap();
        let decoded = GCounter::from_json(&c.to_json()).unwrap();
        assert_eq!(decoded, c);
    }

    #[test]
    fn decode_names_the_offending_key() {
        let err = GCounter::from_json(&json!({"type": "g-counter", "e": {"a": 1.0, "bad": "x"}}))
            .unwrap_err();
        assert!(matches!(err, Error::UnsafeValue { key } if key == "bad"));
    }

    #[test]
    fn decode_rejects_negative_and_non_finite() {
        for bad in [json!(-1.0), json!("1"), Value::Null] {
            let err =
                GCounter::from_json(&json!({"type": "g-counter", "e": {"a": bad}})).unwrap_err();
            assert!(matches!(err, Error::UnsafeValue { .. }));
        }
    }

    #[test]
    fn decode_accepts_zero_slots() {
        let c = GCounter::from_json(&json!({"type": "g-counter", "e": {"a": 0}})).unwrap();
        assert_eq!(c.value(), 0.0);
    }

    #[test]
    fn decode_requires_an_object() {
        let err = GCounter::from_json(&json!({"type": "g-counter", "e": [1, 2]})).unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
    }
}
