//! Polymorphic dispatch across the seven CRDT variants.
//!
//! [`parse`] turns a wire value into an [`AnyCrdt`] by matching the
//! `"type"` discriminator; [`merge`] folds any number of same-variant
//! replicas into their least upper bound. Both fail with type errors on
//! anything heterogeneous.

use serde_json::Value;

use crate::{
    Crdt, Element, Error, GCounter, GSet, LWWESet, MCSet, ORSet, PNCounter, Result, TagMinter,
    TwoPSet,
};

/// A CRDT of any of the seven concrete variants, with dynamic elements.
///
/// This is the closed union the wire layer works with: the set variants are
/// instantiated over [`Element`], so any JSON value can be a member. Typed
/// code should use the concrete generic types directly.
#[derive(Debug, Clone)]
pub enum AnyCrdt {
    /// A grow-only counter.
    GCounter(GCounter),
    /// A positive-negative counter.
    PNCounter(PNCounter),
    /// A grow-only set.
    GSet(GSet<Element>),
    /// A two-phase set.
    TwoPSet(TwoPSet<Element>),
    /// A last-write-wins element set.
    LWWESet(LWWESet<Element>),
    /// An observed-remove set.
    ORSet(ORSet<Element>),
    /// A max-change set.
    MCSet(MCSet<Element>),
}

impl AnyCrdt {
    /// The wire discriminator for this variant.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            AnyCrdt::GCounter(_) => "g-counter",
            AnyCrdt::PNCounter(_) => "pn-counter",
            AnyCrdt::GSet(_) => "g-set",
            AnyCrdt::TwoPSet(_) => "2p-set",
            AnyCrdt::LWWESet(_) => "lww-e-set",
            AnyCrdt::ORSet(_) => "or-set",
            AnyCrdt::MCSet(_) => "mc-set",
        }
    }

    /// Encode through the variant's own `to_json`.
    pub fn to_json(&self) -> Result<Value> {
        match self {
            AnyCrdt::GCounter(c) => Ok(c.to_json()),
            AnyCrdt::PNCounter(c) => Ok(c.to_json()),
            AnyCrdt::GSet(s) => s.to_json(),
            AnyCrdt::TwoPSet(s) => s.to_json(),
            AnyCrdt::LWWESet(s) => s.to_json(),
            AnyCrdt::ORSet(s) => s.to_json(),
            AnyCrdt::MCSet(s) => s.to_json(),
        }
    }
}

impl Crdt for AnyCrdt {
    /// Merge two replicas of the same variant; anything else is a
    /// [`Error::TypeMismatch`].
    fn merge(&self, other: &Self) -> Result<Self> {
        match (self, other) {
            (AnyCrdt::GCounter(a), AnyCrdt::GCounter(b)) => Ok(AnyCrdt::GCounter(a.merge(b)?)),
            (AnyCrdt::PNCounter(a), AnyCrdt::PNCounter(b)) => Ok(AnyCrdt::PNCounter(a.merge(b)?)),
            (AnyCrdt::GSet(a), AnyCrdt::GSet(b)) => Ok(AnyCrdt::GSet(a.merge(b)?)),
            (AnyCrdt::TwoPSet(a), AnyCrdt::TwoPSet(b)) => Ok(AnyCrdt::TwoPSet(a.merge(b)?)),
            (AnyCrdt::LWWESet(a), AnyCrdt::LWWESet(b)) => Ok(AnyCrdt::LWWESet(a.merge(b)?)),
            (AnyCrdt::ORSet(a), AnyCrdt::ORSet(b)) => Ok(AnyCrdt::ORSet(a.merge(b)?)),
            (AnyCrdt::MCSet(a), AnyCrdt::MCSet(b)) => Ok(AnyCrdt::MCSet(a.merge(b)?)),
            (a, b) => Err(Error::TypeMismatch {
                expected: a.type_name(),
                found: b.type_name(),
            }),
        }
    }
}

/// Reconstruct a CRDT from its wire form, dispatching on `"type"`.
///
/// Any OR-Set gets a fresh tag registry; use [`parse_with_minter`] to make
/// several parsed OR-Sets mergeable.
pub fn parse(value: &Value) -> Result<AnyCrdt> {
    parse_with(value, &TagMinter::new())
}

/// Reconstruct a CRDT, re-minting OR-Set tags through a shared registry.
pub fn parse_with_minter(value: &Value, minter: &TagMinter) -> Result<AnyCrdt> {
    parse_with(value, minter)
}

fn parse_with(value: &Value, minter: &TagMinter) -> Result<AnyCrdt> {
    let type_name = value
        .as_object()
        .and_then(|object| object.get("type"))
        .and_then(Value::as_str)
        .ok_or(Error::MissingType)?;
    match type_name {
        "g-counter" => Ok(AnyCrdt::GCounter(GCounter::from_json(value)?)),
        "pn-counter" => Ok(AnyCrdt::PNCounter(PNCounter::from_json(value)?)),
        "g-set" => Ok(AnyCrdt::GSet(GSet::from_json(value)?)),
        "2p-set" => Ok(AnyCrdt::TwoPSet(TwoPSet::from_json(value)?)),
        "lww-e-set" => Ok(AnyCrdt::LWWESet(LWWESet::from_json(value)?)),
        "or-set" => Ok(AnyCrdt::ORSet(ORSet::from_json_with_minter(value, minter)?)),
        "mc-set" => Ok(AnyCrdt::MCSet(MCSet::from_json(value)?)),
        unknown => Err(Error::UnknownType(unknown.to_string())),
    }
}

/// Fold any number of same-variant replicas into their least upper bound.
///
/// A single replica is returned unchanged; an empty slice is an error.
/// Because the binary merge is associative and commutative, the fold order
/// does not affect the result.
pub fn merge(items: &[AnyCrdt]) -> Result<AnyCrdt> {
    let (first, rest) = items.split_first().ok_or(Error::EmptyMerge)?;
    let mut merged = first.clone();
    for item in rest {
        merged = merged.merge(item)?;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_dispatches_on_type() {
        let parsed = parse(&json!({"type": "g-counter", "e": {"a": 2.0}})).unwrap();
        assert_eq!(parsed.type_name(), "g-counter");
        let AnyCrdt::GCounter(counter) = parsed else {
            panic!("expected a GCounter");
        };
        assert_eq!(counter.value(), 2.0);
    }

    #[test]
    fn parse_rejects_unknown_types() {
        let err = parse(&json!({"type": "unknown"})).unwrap_err();
        assert!(matches!(err, Error::UnknownType(_)));
        assert!(err.is_type_error());
    }

    #[test]
    fn parse_rejects_non_objects() {
        for value in [json!(null), json!(42), json!([]), json!({"e": {}})] {
            let err = parse(&value).unwrap_err();
            assert!(matches!(err, Error::MissingType));
        }
    }

    #[test]
    fn merge_of_a_single_item_is_that_item() {
        let mut counter = GCounter::new();
        counter.update(1.0).unwrap();
        let merged = merge(&[AnyCrdt::GCounter(counter.clone())]).unwrap();
        let AnyCrdt::GCounter(result) = merged else {
            panic!("expected a GCounter");
        };
        assert_eq!(result, counter);
    }

    #[test]
    fn merge_of_nothing_fails() {
        assert!(matches!(merge(&[]), Err(Error::EmptyMerge)));
    }

    #[test]
    fn merge_rejects_mixed_variants() {
        let g = AnyCrdt::GCounter(GCounter::new());
        let pn = AnyCrdt::PNCounter(PNCounter::new());
        let err = merge(&[g, pn]).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "g-counter",
                found: "pn-counter",
            }
        ));
        assert!(err.is_type_error());
    }

    #[test]
    fn merge_folds_many_replicas() {
        let replicas: Vec<AnyCrdt> = (0..3)
            .map(|i| {
                let mut c = GCounter::new();
                c.update_for(&format!("node-{i}"), 10.0).unwrap();
                AnyCrdt::GCounter(c)
            })
            .collect();
        let AnyCrdt::GCounter(merged) = merge(&replicas).unwrap() else {
            panic!("expected a GCounter");
        };
        assert_eq!(merged.value(), 30.0);
    }
}
