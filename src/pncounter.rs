use serde_json::{json, Value};

use crate::gcounter::{decode_slots, encode_slots};
use crate::{Crdt, Error, GCounter, Result, NULL_ACTOR};

/// A positive-negative counter (PN-Counter).
///
/// Supports both increment and decrement by maintaining two internal
/// grow-only maps: `p` for increments and `n` for decrements. The value is
/// `sum(p) - sum(n)`.
///
/// # Example
///
/// ```
/// use lattice_kit::prelude::*;
///
/// let mut c1 = PNCounter::new();
/// c1.update_for("node-1", 2.0).unwrap();
///
/// let mut c2 = PNCounter::new();
/// c2.update_for("node-2", -3.0).unwrap();
///
/// let merged = c1.merge(&c2).unwrap();
/// assert_eq!(merged.value(), -1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PNCounter {
    p: GCounter,
    n: GCounter,
}

impl PNCounter {
    /// Create an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add 1 to the [`NULL_ACTOR`] slot.
    pub fn increment(&mut self) -> Result<()> {
        self.update(1.0)
    }

    /// Subtract 1 from the [`NULL_ACTOR`] slot.
    pub fn decrement(&mut self) -> Result<()> {
        self.update(-1.0)
    }

    /// Apply a signed delta for the [`NULL_ACTOR`].
    pub fn update(&mut self, delta: f64) -> Result<()> {
        self.update_for(NULL_ACTOR, delta)
    }

    /// Apply a signed delta for a named actor.
    ///
    /// A positive delta accumulates into `p`, a negative one into `n`.
    /// Zero is a no-op; NaN or an infinity fails.
    pub fn update_for(&mut self, actor: &str, delta: f64) -> Result<()> {
        if !delta.is_finite() {
            return Err(Error::UnsafeAmount);
        }
        if delta == 0.0 {
            return Ok(());
        }
        if delta > 0.0 {
            self.p.update_for(actor, delta)
        } else {
            self.n.update_for(actor, -delta)
        }
    }

    /// Get the current value, `sum(p) - sum(n)`.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.p.value() - self.n.value()
    }

    /// Encode as `{"type":"pn-counter","p":{…},"n":{…}}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "type": "pn-counter",
            "p": encode_slots(self.p.slots()),
            "n": encode_slots(self.n.slots()),
        })
    }

    /// Decode from the wire shape produced by [`PNCounter::to_json`].
    ///
    /// Every slot value in both maps must be a finite, non-negative number.
    pub fn from_json(value: &Value) -> Result<Self> {
        let p = decode_slots(value.get("p"), "a \"p\" object of numbers")?;
        let n = decode_slots(value.get("n"), "an \"n\" object of numbers")?;
        Ok(PNCounter {
            p: GCounter::from_slots(p),
            n: GCounter::from_slots(n),
        })
    }
}

impl Crdt for PNCounter {
    fn merge(&self, other: &Self) -> Result<Self> {
        Ok(PNCounter {
            p: self.p.merge(&other.p)?,
            n: self.n.merge(&other.n)?,
        })
    }
}
