use std::fmt;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

use crate::Result;

/// An arbitrary JSON value in canonical text form.
///
/// The set types in this crate key their state by `T: Ord`, and JSON values
/// carry no total order of their own. `Element` closes that gap for the
/// dispatch layer: it holds the value's canonical serialization (object keys
/// sorted) and compares by that text, so any JSON value can live in a
/// [`GSet`], [`ORSet`], etc. Serialization is transparent: an `Element`
/// round-trips through the wire as the value itself, not as a string.
///
/// # Example
///
/// ```
/// use lattice_kit::Element;
///
/// let a = Element::new(&("x", 1)).unwrap();
/// let b = Element::from_value(&serde_json::json!(["x", 1]));
/// assert_eq!(a, b);
/// ```
///
/// [`GSet`]: crate::GSet
/// [`ORSet`]: crate::ORSet
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Element(String);

impl Element {
    /// Encode any serializable value as an element.
    pub fn new<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::from_value(&serde_json::to_value(value)?))
    }

    /// Wrap an already-parsed JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Element(value.to_string())
    }

    /// Decode back into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::from_str(&self.0).unwrap_or(Value::Null)
    }

    /// The canonical JSON text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Element::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_values_are_equal_elements() {
        let a = Element::from_value(&json!({"x": 1, "y": 2}));
        let b = Element::from_value(&json!({"y": 2, "x": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn round_trips_through_value() {
        let v = json!([1, "two", {"three": 3}]);
        assert_eq!(Element::from_value(&v).to_value(), v);
    }

    #[test]
    fn serializes_as_the_inner_value() {
        let e = Element::from_value(&json!({"k": [1, 2]}));
        assert_eq!(serde_json::to_value(&e).unwrap(), json!({"k": [1, 2]}));
    }

    #[test]
    fn orders_deterministically() {
        let mut elems = vec![
            Element::from_value(&json!("b")),
            Element::from_value(&json!("a")),
        ];
        elems.sort();
        assert_eq!(elems[0].to_value(), json!("a"));
    }
}
