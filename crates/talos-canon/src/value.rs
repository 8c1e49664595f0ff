use std::collections::BTreeMap;

use crate::CanonError;

/// An already-validated in-memory value ready to be canonically encoded.
///
/// Keys of [`CanonicalValue::Object`] are held in a `BTreeMap`, which keeps
/// them lexicographically sorted at every level for free. There is
/// deliberately no `Null` or floating-point variant: forbidden types are
/// rejected at construction (`from_json`) rather than representable and
/// silently coerced.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    /// A UTF-8 string.
    String(String),
    /// A decimal integer.
    Integer(i64),
    /// A boolean.
    Bool(bool),
    /// Raw bytes, rendered as base64url without padding.
    Bytes(Vec<u8>),
    /// An ordered (by key) mapping.
    Object(BTreeMap<String, CanonicalValue>),
    /// An ordered list.
    Array(Vec<CanonicalValue>),
}

impl CanonicalValue {
    /// Build an object from key/value pairs, taking ownership.
    pub fn object(pairs: impl IntoIterator<Item = (String, CanonicalValue)>) -> Self {
        CanonicalValue::Object(pairs.into_iter().collect())
    }

    /// Build an array.
    pub fn array(items: impl IntoIterator<Item = CanonicalValue>) -> Self {
        CanonicalValue::Array(items.into_iter().collect())
    }

    /// Convert a [`serde_json::Value`] into a [`CanonicalValue`], rejecting
    /// floats and nulls, which have no single canonical byte representation.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CanonError> {
        crate::json::from_json(value)
    }

    /// Borrow the field named `key` if this is an object and it is present.
    pub fn get(&self, key: &str) -> Option<&CanonicalValue> {
        match self {
            CanonicalValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// The canonical byte encoding of this value.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        crate::encode::write(self, &mut out);
        out
    }

    /// Parse canonical bytes back into a [`CanonicalValue`].
    pub fn parse(bytes: &[u8]) -> Result<Self, CanonError> {
        crate::parse::parse(bytes)
    }
}
