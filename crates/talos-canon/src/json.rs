use crate::{CanonError, CanonicalValue};

/// Convert a parsed `serde_json::Value` into a [`CanonicalValue`].
///
/// `Null` and non-integer `Number`s are rejected outright; the caller
/// should omit a field rather than set it to `null`.
pub fn from_json(value: &serde_json::Value) -> Result<CanonicalValue, CanonError> {
    match value {
        serde_json::Value::Null => {
            Err(CanonError::InvalidInput("null is forbidden".to_string()))
        }
        serde_json::Value::Bool(b) => Ok(CanonicalValue::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(CanonicalValue::Integer(i))
            } else {
                Err(CanonError::InvalidInput(format!(
                    "non-integer number: {n}"
                )))
            }
        }
        serde_json::Value::String(s) => Ok(CanonicalValue::String(s.clone())),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(from_json(item)?);
            }
            Ok(CanonicalValue::Array(out))
        }
        serde_json::Value::Object(map) => {
            let mut out = std::collections::BTreeMap::new();
            for (k, v) in map {
                out.insert(k.clone(), from_json(v)?);
            }
            Ok(CanonicalValue::Object(out))
        }
    }
}
